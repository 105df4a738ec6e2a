use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 3;
pub const ARM_COUNT: usize = 3;
pub const MAX_HIDDEN_LEVEL: u8 = 4;
/// Scored rounds kept in [`SessionState::rounds`]; older rounds are dropped.
pub const ROUND_HISTORY: usize = 20;

/// Attempts/successes for one colour or shape category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub attempts: u32,
    pub successes: u32,
}

impl CategoryStats {
    pub fn new(attempts: u32, successes: u32) -> Self {
        Self {
            attempts,
            successes,
        }
    }

    /// Successes capped at attempts.
    pub fn effective_successes(&self) -> u32 {
        self.successes.min(self.attempts)
    }
}

/// Telemetry for one completed round, produced by the game client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    pub completion_time: f64,
    pub level: u8,
    pub total_pairs: u32,
    pub failed_matches: u32,
    pub total_matches: u32,
    pub flip_intervals: Vec<f64>,
    pub total_clicks: u32,
    pub color_stats: HashMap<String, CategoryStats>,
    pub shape_stats: HashMap<String, CategoryStats>,
    pub cheat_count: u32,
    pub max_consecutive_errors: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_cols: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_rows: Option<u32>,
}

impl PerformanceMetrics {
    /// Level clamped into the playable range, unknown levels fall back to 1.
    pub fn sanitized_level(&self) -> u8 {
        sanitize_level(self.level)
    }

    pub fn successful_matches(&self) -> u32 {
        self.total_matches.saturating_sub(self.failed_matches)
    }

    /// `min(1, cheats / pairs)`; a missing pair count counts as one pair.
    pub fn cheat_ratio(&self) -> f64 {
        if self.cheat_count == 0 {
            return 0.0;
        }
        (self.cheat_count as f64 / self.total_pairs.max(1) as f64).min(1.0)
    }

    pub fn grid_size(&self) -> Option<GridSize> {
        match (self.grid_cols, self.grid_rows) {
            (Some(cols), Some(rows)) if cols > 0 && rows > 0 => Some(GridSize::from_dims(cols, rows)),
            _ => None,
        }
    }
}

pub fn sanitize_level(level: u8) -> u8 {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        level
    } else {
        MIN_LEVEL
    }
}

/// Normalized quantities in `[0,1]` fed to the membership stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSignals {
    pub time: f64,
    pub error_rate: f64,
    pub cadence_variance: f64,
    pub click_accuracy: f64,
    pub color_accuracy: f64,
    pub shape_accuracy: f64,
}

impl Default for NormalizedSignals {
    fn default() -> Self {
        Self {
            time: 0.5,
            error_rate: 0.5,
            cadence_variance: 0.5,
            click_accuracy: 0.5,
            color_accuracy: 0.5,
            shape_accuracy: 0.5,
        }
    }
}

/// Display bucket for a Flow Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowLabel {
    Excellent,
    Good,
    Moderate,
    HighDifficulty,
}

impl FlowLabel {
    pub fn from_flow_index(flow: f64) -> Self {
        if flow >= 0.8 {
            Self::Excellent
        } else if flow >= 0.6 {
            Self::Good
        } else if flow >= 0.4 {
            Self::Moderate
        } else {
            Self::HighDifficulty
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::HighDifficulty => "High difficulty",
        }
    }
}

/// Everything the scorer derives from one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDiagnostics {
    pub signals: NormalizedSignals,
    pub color_sensitivity: BTreeMap<String, f64>,
    pub cheat_penalty: f64,
    pub base_flow_index: f64,
    pub flow_index_raw: f64,
    pub flow_index_display: f64,
    pub rule_activations: Vec<f64>,
    pub label: FlowLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub avg_flow: f64,
    pub error_rate: f64,
    pub cadence: f64,
    pub fatigue: f64,
    pub hidden_difficulty: f64,
    pub cheat_ratio: f64,
    pub max_consecutive_errors: u32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            avg_flow: 0.5,
            error_rate: 0.2,
            cadence: 0.5,
            fatigue: 0.0,
            hidden_difficulty: 0.5,
            cheat_ratio: 0.0,
            max_consecutive_errors: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSize {
    #[default]
    Small,
    Large,
}

impl GridSize {
    pub const SMALL_DIMS: (u32, u32) = (5, 4);
    pub const LARGE_DIMS: (u32, u32) = (6, 4);

    pub fn from_dims(cols: u32, rows: u32) -> Self {
        let (small_cols, small_rows) = Self::SMALL_DIMS;
        if cols.saturating_mul(rows) > small_cols * small_rows {
            Self::Large
        } else {
            Self::Small
        }
    }

    pub fn dims(&self) -> (u32, u32) {
        match self {
            Self::Small => Self::SMALL_DIMS,
            Self::Large => Self::LARGE_DIMS,
        }
    }

    pub fn is_large(&self) -> bool {
        matches!(self, Self::Large)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintPolicy {
    Generous,
    #[default]
    Standard,
    Limited,
}

impl HintPolicy {
    pub fn for_arm(arm: usize) -> Self {
        match arm {
            0 => Self::Generous,
            1 => Self::Standard,
            _ => Self::Limited,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generous => "generous",
            Self::Standard => "standard",
            Self::Limited => "limited",
        }
    }
}

/// Pairing rule for level 3 boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PairsType {
    /// Both cards of a pair are the same card.
    Identical,
    /// Cards pair when they share a base colour family.
    ColorFamily,
    /// Colour-family and shape pairs on the same board.
    Mixed,
}

impl PairsType {
    pub fn for_arm(arm: usize) -> Self {
        match arm {
            0 => Self::Identical,
            1 => Self::ColorFamily,
            _ => Self::Mixed,
        }
    }
}

/// Board parameters for the next round. Built fresh per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfiguration {
    pub level: u8,
    pub arm: usize,
    pub initial_time: u32,
    pub match_reward: u32,
    pub hide_delay: u32,
    pub show_scale: f64,
    pub hint_policy: HintPolicy,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub total_pairs: u32,
    pub hidden_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjacent_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjacent_target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs_type: Option<PairsType>,
}

impl GameConfiguration {
    pub fn grid_size(&self) -> GridSize {
        GridSize::from_dims(self.grid_cols, self.grid_rows)
    }
}

/// One scored round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub flow_index: f64,
    pub metrics: PerformanceMetrics,
    pub timestamp: i64,
}

/// The round handed out by `decide_next_config` and not yet rewarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRound {
    pub arm: usize,
    pub config: GameConfiguration,
    pub profile: PlayerProfile,
    pub context_level: u8,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_level: u8,
    /// Most recent rounds, oldest first, at most [`ROUND_HISTORY`].
    pub rounds: Vec<Round>,
    /// Rounds scored this session, including ones dropped from `rounds`.
    #[serde(default)]
    pub total_rounds: usize,
    #[serde(default)]
    pub played_levels: BTreeSet<u8>,
    pub pending: Option<PendingRound>,
    pub last_hidden_level: Option<u8>,
    pub last_arm: Option<usize>,
    pub last_adjacent_rate: Option<f64>,
    pub last_adjacent_target: Option<u32>,
    pub last_grid_size: GridSize,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current_level: MIN_LEVEL,
            ..Default::default()
        }
    }

    pub fn rounds_played(&self) -> usize {
        self.total_rounds.max(self.rounds.len())
    }

    pub fn record_round(&mut self, round: Round) {
        self.played_levels.insert(round.metrics.sanitized_level());
        self.total_rounds = self.rounds_played() + 1;
        self.rounds.push(round);
        if self.rounds.len() > ROUND_HISTORY {
            let excess = self.rounds.len() - ROUND_HISTORY;
            self.rounds.drain(..excess);
        }
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Up to `n` most recent rounds, oldest first.
    pub fn recent_rounds(&self, n: usize) -> &[Round] {
        let start = self.rounds.len().saturating_sub(n);
        &self.rounds[start..]
    }

    pub fn has_played_level(&self, level: u8) -> bool {
        self.played_levels.contains(&level)
            || self
                .rounds
                .iter()
                .any(|round| round.metrics.sanitized_level() == level)
    }
}

/// Onboarding hints supplied at session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitialSignals {
    pub has_played_before: bool,
    pub previous_best_level: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_label_thresholds() {
        assert_eq!(FlowLabel::from_flow_index(0.85), FlowLabel::Excellent);
        assert_eq!(FlowLabel::from_flow_index(0.8), FlowLabel::Excellent);
        assert_eq!(FlowLabel::from_flow_index(0.6), FlowLabel::Good);
        assert_eq!(FlowLabel::from_flow_index(0.45), FlowLabel::Moderate);
        assert_eq!(FlowLabel::from_flow_index(0.1), FlowLabel::HighDifficulty);
    }

    #[test]
    fn grid_size_from_dims() {
        assert_eq!(GridSize::from_dims(5, 4), GridSize::Small);
        assert_eq!(GridSize::from_dims(6, 4), GridSize::Large);
        assert_eq!(GridSize::from_dims(4, 4), GridSize::Small);
    }

    #[test]
    fn metrics_deserialize_with_missing_fields() {
        let metrics: PerformanceMetrics =
            serde_json::from_str(r#"{"completionTime": 42.0, "level": 2}"#).unwrap();
        assert_eq!(metrics.level, 2);
        assert_eq!(metrics.total_pairs, 0);
        assert!(metrics.flip_intervals.is_empty());
        assert!(metrics.grid_size().is_none());
    }

    #[test]
    fn cheat_ratio_is_capped() {
        let metrics = PerformanceMetrics {
            total_pairs: 4,
            cheat_count: 9,
            ..Default::default()
        };
        assert_eq!(metrics.cheat_ratio(), 1.0);
    }

    #[test]
    fn recent_rounds_keeps_order() {
        let mut session = SessionState::new();
        for i in 0..5 {
            session.record_round(Round {
                flow_index: i as f64 / 10.0,
                metrics: PerformanceMetrics::default(),
                timestamp: i,
            });
        }
        let recent = session.recent_rounds(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].timestamp, 2);
        assert_eq!(recent[2].timestamp, 4);
    }

    #[test]
    fn history_is_capped_but_counts_and_levels_survive() {
        let mut session = SessionState::new();
        for i in 0..(ROUND_HISTORY + 5) {
            let level = if i == 0 { 3 } else { 1 };
            session.record_round(Round {
                flow_index: 0.5,
                metrics: PerformanceMetrics {
                    level,
                    flip_intervals: vec![400.0; 30],
                    ..Default::default()
                },
                timestamp: i as i64,
            });
        }
        assert_eq!(session.rounds.len(), ROUND_HISTORY);
        assert_eq!(session.rounds_played(), ROUND_HISTORY + 5);
        assert_eq!(session.rounds[0].timestamp, 5);
        assert!(session.rounds.iter().all(|r| r.metrics.level == 1));
        assert!(session.has_played_level(3));
        assert!(!session.has_played_level(2));
    }

    #[test]
    fn unknown_level_falls_back_to_one() {
        assert_eq!(sanitize_level(0), 1);
        assert_eq!(sanitize_level(7), 1);
        assert_eq!(sanitize_level(3), 3);
    }
}
