use serde::{Deserialize, Serialize};

/// Triangular membership parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub min: f64,
    pub max: f64,
    pub peak: f64,
}

impl Triangle {
    pub const fn new(min: f64, max: f64, peak: f64) -> Self {
        Self { min, max, peak }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeMembership {
    pub fast: Triangle,
    pub medium: Triangle,
    pub slow: Triangle,
}

impl Default for TimeMembership {
    fn default() -> Self {
        Self {
            fast: Triangle::new(-0.4, 0.45, 0.0),
            medium: Triangle::new(0.2, 0.8, 0.5),
            slow: Triangle::new(0.55, 1.4, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMembership {
    pub low: Triangle,
    pub medium: Triangle,
    pub high: Triangle,
}

impl Default for ErrorMembership {
    fn default() -> Self {
        Self {
            low: Triangle::new(-0.3, 0.3, 0.0),
            medium: Triangle::new(0.15, 0.6, 0.35),
            high: Triangle::new(0.4, 1.3, 1.0),
        }
    }
}

/// High/low pair used for click, colour and shape accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyMembership {
    pub high: Triangle,
    pub low: Triangle,
}

impl Default for AccuracyMembership {
    fn default() -> Self {
        Self {
            high: Triangle::new(0.5, 1.5, 1.0),
            low: Triangle::new(-0.5, 0.5, 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Expected seconds per pair, indexed by level - 1.
    pub per_pair_seconds: [f64; 3],
    pub time: TimeMembership,
    pub error: ErrorMembership,
    /// Crisp split between stable and variable cadence.
    pub cadence_threshold: f64,
    pub click: AccuracyMembership,
    pub color: AccuracyMembership,
    pub shape: AccuracyMembership,
    pub display_floor: f64,
    pub max_cheat_penalty: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            per_pair_seconds: [20.0, 15.0, 12.0],
            time: TimeMembership::default(),
            error: ErrorMembership::default(),
            cadence_threshold: 0.5,
            click: AccuracyMembership::default(),
            color: AccuracyMembership::default(),
            shape: AccuracyMembership::default(),
            display_floor: 0.3,
            max_cheat_penalty: 0.5,
        }
    }
}

impl ScorerConfig {
    pub fn per_pair_seconds(&self, level: u8) -> f64 {
        let idx = crate::types::sanitize_level(level) as usize - 1;
        self.per_pair_seconds[idx]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditConfig {
    pub alpha: f64,
    /// Fixed RNG seed for reproducible exploration; clock-seeded when unset.
    pub seed: Option<u64>,
    pub tie_epsilon: f64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            seed: None,
            tie_epsilon: 1e-12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub profile_alpha: f64,
    pub hidden_alpha: f64,
    pub flow_prior: f64,
    pub error_prior: f64,
    pub cadence_prior: f64,
    pub hidden_prior: f64,
    /// Rounds after which fatigue saturates at 1.
    pub fatigue_rounds: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            profile_alpha: 0.35,
            hidden_alpha: 0.3,
            flow_prior: 0.5,
            error_prior: 0.2,
            cadence_prior: 0.5,
            hidden_prior: 0.5,
            fatigue_rounds: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    pub large_grid_upgrade_flow: f64,
    pub large_grid_downgrade_flow: f64,
    pub downgrade_window: usize,
    pub grid_history: usize,
    pub adjacent_rate_step: f64,
    pub adjacent_rate_min: f64,
    pub adjacent_rate_max: f64,
    /// Hide delay (ms) per hidden level; levels past the end reuse the last entry.
    pub hidden_hide_delay: Vec<u32>,
    pub hidden_show_scale: Vec<f64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            large_grid_upgrade_flow: 0.7,
            large_grid_downgrade_flow: 0.4,
            downgrade_window: 2,
            grid_history: 3,
            adjacent_rate_step: 0.05,
            adjacent_rate_min: 0.2,
            adjacent_rate_max: 0.6,
            hidden_hide_delay: vec![600, 400, 300, 240],
            hidden_show_scale: vec![1.5, 1.3, 1.2, 1.1],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scorer: ScorerConfig,
    pub bandit: BanditConfig,
    pub smoothing: SmoothingConfig,
    pub pacing: PacingConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse::<f64>("FLOW_BANDIT_ALPHA") {
            if val.is_finite() && val >= 0.0 {
                config.bandit.alpha = val;
            }
        }
        if let Some(val) = env_parse::<u64>("FLOW_BANDIT_SEED") {
            config.bandit.seed = Some(val);
        }
        if let Some(val) = env_parse::<f64>("FLOW_PROFILE_SMOOTHING") {
            if (0.0..=1.0).contains(&val) {
                config.smoothing.profile_alpha = val;
            }
        }
        if let Some(val) = env_parse::<f64>("FLOW_HIDDEN_SMOOTHING") {
            if (0.0..=1.0).contains(&val) {
                config.smoothing.hidden_alpha = val;
            }
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.bandit.seed = Some(seed);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
