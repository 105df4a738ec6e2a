use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decision::coldstart;
use crate::decision::linucb::{ArmContext, Bandit};
use crate::decision::pacing;
use crate::fuzzy::FlowScorer;
use crate::sanitize::{clamp01, smooth};
use crate::types::*;

/// Result of [`AdaptiveEngine::advance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub flow_index: f64,
    pub diagnostics: FlowDiagnostics,
    pub config: GameConfiguration,
}

/// Per-player coordinator. Owns the profile, session history and bandit;
/// one instance per concurrently playing session, never shared.
pub struct AdaptiveEngine {
    config: EngineConfig,
    scorer: FlowScorer,
    bandit: Bandit,
    profile: PlayerProfile,
    session: SessionState,
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        let bandit = Bandit::new(&config.bandit);
        Self::with_bandit(config, bandit)
    }

    pub fn with_bandit(config: EngineConfig, bandit: Bandit) -> Self {
        Self {
            scorer: FlowScorer::new(config.scorer.clone()),
            bandit,
            profile: PlayerProfile::default(),
            session: SessionState::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn bandit(&self) -> &Bandit {
        &self.bandit
    }

    pub fn scorer(&self) -> &FlowScorer {
        &self.scorer
    }

    pub(crate) fn replace_state(
        &mut self,
        profile: PlayerProfile,
        session: SessionState,
        bandit: Bandit,
    ) {
        self.profile = profile;
        self.session = session;
        self.bandit = bandit;
    }

    /// Start a fresh session: profile, history and bandit statistics.
    pub fn reset(&mut self) {
        self.profile = PlayerProfile::default();
        self.session = SessionState::new();
        self.bandit.reset();
        tracing::debug!("session reset");
    }

    /// Starting level for a new session.
    pub fn initial_difficulty(&self, signals: &InitialSignals) -> u8 {
        coldstart::initial_difficulty(signals)
    }

    /// Score a finished round and fold it into the profile. Returns the raw
    /// Flow Index.
    pub fn process_game_end(&mut self, metrics: &PerformanceMetrics) -> f64 {
        self.process_game_end_detailed(metrics).flow_index_raw
    }

    pub fn process_game_end_detailed(&mut self, metrics: &PerformanceMetrics) -> FlowDiagnostics {
        let diagnostics = self.scorer.score(metrics);
        let flow = diagnostics.flow_index_raw;
        let signals = diagnostics.signals;

        self.session.record_round(Round {
            flow_index: flow,
            metrics: metrics.clone(),
            timestamp: now_millis(),
        });
        self.session.current_level = metrics.sanitized_level();

        let s = &self.config.smoothing;
        self.profile.avg_flow = smooth(self.profile.avg_flow, flow, s.profile_alpha, s.flow_prior);
        self.profile.error_rate = smooth(
            self.profile.error_rate,
            signals.error_rate,
            s.profile_alpha,
            s.error_prior,
        );
        self.profile.cadence = smooth(
            self.profile.cadence,
            signals.cadence_variance,
            s.profile_alpha,
            s.cadence_prior,
        );
        self.profile.cheat_ratio = metrics.cheat_ratio();
        self.profile.max_consecutive_errors = metrics.max_consecutive_errors;

        if let Some(grid) = metrics.grid_size() {
            self.session.last_grid_size = grid;
        }

        self.update_hidden_difficulty(flow, metrics, &signals);

        tracing::debug!(
            round = self.session.rounds_played(),
            level = self.session.current_level,
            flow,
            base = diagnostics.base_flow_index,
            cheat_penalty = diagnostics.cheat_penalty,
            avg_flow = self.profile.avg_flow,
            hidden_level = ?self.session.last_hidden_level,
            "round scored"
        );

        diagnostics
    }

    fn update_hidden_difficulty(
        &mut self,
        flow: f64,
        metrics: &PerformanceMetrics,
        signals: &NormalizedSignals,
    ) {
        let streak = (metrics.max_consecutive_errors as f64 / 5.0).min(1.0);
        let target = clamp01(
            0.5 * flow + 0.3 * (1.0 - metrics.cheat_ratio()) + 0.2 * signals.click_accuracy
                - 0.2 * signals.error_rate
                - 0.1 * streak,
        );

        let s = &self.config.smoothing;
        self.profile.hidden_difficulty = clamp01(smooth(
            self.profile.hidden_difficulty,
            target,
            s.hidden_alpha,
            s.hidden_prior,
        ));

        let raw = pacing::hidden_level_for(self.profile.hidden_difficulty);
        self.session.last_hidden_level =
            Some(pacing::step_hidden_level(raw, self.session.last_hidden_level));
    }

    /// Credit `reward` to the arm handed out by the last
    /// [`decide_next_config`](Self::decide_next_config), using the profile as it
    /// was when that arm was chosen. Each pending round is rewarded once.
    pub fn update_bandit(&mut self, reward: f64) -> bool {
        if !reward.is_finite() {
            tracing::warn!(reward, "ignoring non-finite reward");
            return false;
        }
        let Some(pending) = self.session.pending.take() else {
            tracing::debug!("no pending round to reward");
            return false;
        };
        let ctx = ArmContext::from_profile(pending.context_level, &pending.profile);
        let updated = self.bandit.update(pending.arm, &ctx, reward);
        tracing::debug!(arm = pending.arm, reward, updated, "bandit updated");
        updated
    }

    /// Build the configuration for the next round at `level`.
    pub fn decide_next_config(&mut self, level: u8) -> GameConfiguration {
        let level = sanitize_level(level);
        let rounds = self.session.rounds_played();
        let fatigue_rounds = self.config.smoothing.fatigue_rounds.max(1.0);
        self.profile.fatigue = (rounds as f64 / fatigue_rounds).min(1.0);

        let context_level = if rounds == 0 {
            level
        } else {
            self.session.current_level
        };
        let ctx = ArmContext::from_profile(context_level, &self.profile);
        let selection = self.bandit.select_arm(&ctx);
        let arm = pacing::step_arm(selection.arm, self.session.last_arm);

        let mut config = self.bandit.config_for(arm, level);

        if level >= 2 {
            let (cols, rows) = self.grid_for(level, arm).dims();
            config.grid_cols = cols;
            config.grid_rows = rows;
            config.total_pairs = pacing::total_pairs(cols, rows);
            config.initial_time = pacing::initial_time(level, config.total_pairs, arm);
        }

        if level == 2 {
            self.apply_adjacency(&mut config);
        }

        let profile_level = pacing::hidden_level_for(self.profile.hidden_difficulty);
        let hidden_level = (*self
            .session
            .last_hidden_level
            .get_or_insert(profile_level))
        .min(MAX_HIDDEN_LEVEL);
        config.hidden_level = hidden_level;
        if let Some((hide_delay, show_scale)) =
            pacing::hidden_timing(hidden_level, &self.config.pacing)
        {
            config.hide_delay = hide_delay;
            config.show_scale = show_scale;
        }

        self.session.last_arm = Some(arm);
        self.session.last_grid_size = config.grid_size();
        self.session.pending = Some(PendingRound {
            arm,
            config: config.clone(),
            profile: self.profile.clone(),
            context_level,
            timestamp: now_millis(),
        });

        tracing::debug!(
            level,
            proposed_arm = selection.arm,
            arm,
            forced = selection.forced,
            score = selection.score,
            grid = ?config.grid_size(),
            hidden_level,
            "next round configured"
        );

        config
    }

    fn grid_for(&self, level: u8, arm: usize) -> GridSize {
        if !self.session.has_played_level(level) || arm == 0 {
            return GridSize::Small;
        }
        let recent = self.session.recent_rounds(self.config.pacing.grid_history);
        if pacing::should_use_large_grid(
            &self.profile,
            recent,
            self.session.last_grid_size.is_large(),
            &self.config.pacing,
        ) {
            GridSize::Large
        } else {
            GridSize::Small
        }
    }

    fn apply_adjacency(&mut self, config: &mut GameConfiguration) {
        let target = match self.session.last_round() {
            Some(round) => pacing::adjacent_rate_for_flow(round.flow_index),
            None => config
                .adjacent_rate
                .unwrap_or(pacing::ADJACENT_RATE_SEED[config.arm]),
        };
        let rate =
            pacing::next_adjacent_rate(target, self.session.last_adjacent_rate, &self.config.pacing);
        let adjacent_target = pacing::adjacent_target(rate, config.total_pairs);

        config.neighbor_mode = Some(true);
        config.adjacent_rate = Some(rate);
        config.adjacent_target = Some(adjacent_target);
        self.session.last_adjacent_rate = Some(rate);
        self.session.last_adjacent_target = Some(adjacent_target);
    }

    /// One full round turn: score, reward the pending arm, configure the next
    /// round.
    pub fn advance(&mut self, metrics: &PerformanceMetrics, next_level: u8) -> RoundOutcome {
        let diagnostics = self.process_game_end_detailed(metrics);
        let flow_index = diagnostics.flow_index_raw;
        self.update_bandit(flow_index);
        let config = self.decide_next_config(next_level);
        RoundOutcome {
            flow_index,
            diagnostics,
            config,
        }
    }
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
