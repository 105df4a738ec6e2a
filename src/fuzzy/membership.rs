use crate::config::{ScorerConfig, Triangle};
use crate::types::NormalizedSignals;

/// Degree of `x` in a triangular fuzzy set: 1 at the peak, 0 at or beyond the
/// edges, linear in between.
pub fn triangular(x: f64, t: &Triangle) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    if x == t.peak {
        return 1.0;
    }
    if x <= t.min || x >= t.max {
        return 0.0;
    }
    if x < t.peak {
        (x - t.min) / (t.peak - t.min)
    } else {
        (t.max - x) / (t.max - t.peak)
    }
}

/// Degrees of truth for every linguistic label used by the rule table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Memberships {
    pub time_fast: f64,
    pub time_medium: f64,
    pub time_slow: f64,
    pub error_low: f64,
    pub error_medium: f64,
    pub error_high: f64,
    pub cadence_stable: f64,
    pub cadence_variable: f64,
    pub click_high: f64,
    pub click_low: f64,
    pub color_high: f64,
    pub color_low: f64,
    pub shape_high: f64,
    pub shape_low: f64,
}

impl Memberships {
    pub fn evaluate(signals: &NormalizedSignals, config: &ScorerConfig) -> Self {
        // Cadence is a crisp split, not a fuzzy set.
        let stable = if signals.cadence_variance <= config.cadence_threshold {
            1.0
        } else {
            0.0
        };

        Self {
            time_fast: triangular(signals.time, &config.time.fast),
            time_medium: triangular(signals.time, &config.time.medium),
            time_slow: triangular(signals.time, &config.time.slow),
            error_low: triangular(signals.error_rate, &config.error.low),
            error_medium: triangular(signals.error_rate, &config.error.medium),
            error_high: triangular(signals.error_rate, &config.error.high),
            cadence_stable: stable,
            cadence_variable: 1.0 - stable,
            click_high: triangular(signals.click_accuracy, &config.click.high),
            click_low: triangular(signals.click_accuracy, &config.click.low),
            color_high: triangular(signals.color_accuracy, &config.color.high),
            color_low: triangular(signals.color_accuracy, &config.color.low),
            shape_high: triangular(signals.shape_accuracy, &config.shape.high),
            shape_low: triangular(signals.shape_accuracy, &config.shape.low),
        }
    }
}
