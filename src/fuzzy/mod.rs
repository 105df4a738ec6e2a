//! Fuzzy-inference scorer turning round telemetry into a Flow Index.
//!
//! Pipeline: [`normalize`] maps raw telemetry into `[0,1]` signals,
//! [`membership`] fuzzifies them into linguistic labels, [`rules`] fires the
//! fixed 16-rule base and defuzzifies by weighted average. The cheat penalty is
//! applied last.

pub mod membership;
pub mod normalize;
pub mod palette;
pub mod rules;

use crate::config::ScorerConfig;
use crate::sanitize::clamp01;
use crate::types::{FlowDiagnostics, FlowLabel, NormalizedSignals, PerformanceMetrics};

use membership::Memberships;

/// Stateless scorer; holds only its membership and timing configuration.
#[derive(Debug, Clone, Default)]
pub struct FlowScorer {
    config: ScorerConfig,
}

impl FlowScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Raw Flow Index in `[0,1]`.
    pub fn flow_index(&self, metrics: &PerformanceMetrics) -> f64 {
        self.score(metrics).flow_index_raw
    }

    pub fn score(&self, metrics: &PerformanceMetrics) -> FlowDiagnostics {
        let signals = normalize::normalize(metrics, &self.config);
        let memberships = Memberships::evaluate(&signals, &self.config);
        let outputs = rules::evaluate(&memberships, metrics.failed_matches == 0);

        let base_flow_index =
            clamp01(rules::defuzzify(&outputs).unwrap_or_else(|| fallback_flow(&signals)));
        let cheat_penalty = normalize::cheat_penalty(metrics, &self.config);
        let flow_index_raw = clamp01(base_flow_index * cheat_penalty);
        let flow_index_display = flow_index_raw.max(self.config.display_floor);

        FlowDiagnostics {
            signals,
            color_sensitivity: normalize::color_sensitivity(&metrics.color_stats),
            cheat_penalty,
            base_flow_index,
            flow_index_raw,
            flow_index_display,
            rule_activations: outputs.iter().map(|r| r.activation).collect(),
            label: FlowLabel::from_flow_index(flow_index_raw),
        }
    }
}

/// Crisp blend used when no rule fires.
fn fallback_flow(signals: &NormalizedSignals) -> f64 {
    0.45 * (1.0 - signals.time) + 0.35 * (1.0 - signals.error_rate) + 0.2 * signals.click_accuracy
}
