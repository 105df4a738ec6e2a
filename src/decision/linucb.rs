use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::pacing;
use crate::config::BanditConfig;
use crate::error::{EngineError, Result};
use crate::matrix::{
    dot_product, identity, invert_or_identity, is_symmetric, mat_vec_mul, rank1_update_matrix,
    vec_add_scaled,
};
use crate::sanitize::{has_invalid_values, sanitize_feature_vector};
use crate::types::{
    sanitize_level, GameConfiguration, HintPolicy, PairsType, PlayerProfile, ARM_COUNT, MAX_LEVEL,
};

pub const CONTEXT_DIM: usize = 7;

/// Context vector `[level/3, avg_flow, error_rate, cadence, fatigue,
/// hidden_difficulty, cheat_ratio]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmContext {
    values: [f64; CONTEXT_DIM],
}

impl ArmContext {
    pub fn new(mut values: [f64; CONTEXT_DIM]) -> Self {
        sanitize_feature_vector(&mut values);
        Self { values }
    }

    /// `level` is the level the profile was last scored against.
    pub fn from_profile(level: u8, profile: &PlayerProfile) -> Self {
        Self::new([
            sanitize_level(level) as f64 / MAX_LEVEL as f64,
            profile.avg_flow,
            profile.error_rate,
            profile.cadence,
            profile.fatigue,
            profile.hidden_difficulty,
            profile.cheat_ratio,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Ridge-regression statistics for one arm. `A` is row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmModel {
    #[serde(rename = "A")]
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub plays: u32,
}

impl ArmModel {
    pub fn new(d: usize) -> Self {
        Self {
            a: identity(d),
            b: vec![0.0; d],
            plays: 0,
        }
    }

    /// `θ = A⁻¹b`, plus whether the identity fallback was used.
    pub fn theta(&self) -> (Vec<f64>, bool) {
        let (a_inv, singular) = invert_or_identity(&self.a, CONTEXT_DIM);
        (mat_vec_mul(&a_inv, &self.b, CONTEXT_DIM), singular)
    }

    fn ucb(&self, x: &[f64], alpha: f64) -> UcbStats {
        let (a_inv, singular) = invert_or_identity(&self.a, CONTEXT_DIM);
        let theta = mat_vec_mul(&a_inv, &self.b, CONTEXT_DIM);
        let expected = dot_product(&theta, x);
        let a_inv_x = mat_vec_mul(&a_inv, x, CONTEXT_DIM);
        let confidence = alpha * dot_product(x, &a_inv_x).max(0.0).sqrt();
        UcbStats {
            expected,
            confidence,
            score: expected + confidence,
            singular,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct UcbStats {
    expected: f64,
    confidence: f64,
    score: f64,
    singular: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSelection {
    pub arm: usize,
    /// Chosen among never-played arms rather than by UCB.
    pub forced: bool,
    pub expected: f64,
    pub confidence: f64,
    pub score: f64,
    pub all_scores: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanditState {
    pub alpha: f64,
    pub arms: Vec<ArmModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmDiagnostics {
    pub plays: u32,
    pub theta: Vec<f64>,
    pub symmetric: bool,
    pub singular: bool,
}

/// Disjoint LinUCB over the three difficulty presets.
pub struct Bandit {
    arms: Vec<ArmModel>,
    alpha: f64,
    tie_epsilon: f64,
    seed: Option<u64>,
    rng: ChaCha8Rng,
}

impl Bandit {
    pub fn new(config: &BanditConfig) -> Self {
        Self {
            arms: (0..ARM_COUNT).map(|_| ArmModel::new(CONTEXT_DIM)).collect(),
            alpha: config.alpha.max(0.0),
            tie_epsilon: config.tie_epsilon.max(0.0),
            seed: config.seed,
            rng: make_rng(config.seed),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(&BanditConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    /// Rebuild from persisted statistics; the RNG is reseeded from `config`.
    pub fn from_state(mut state: BanditState, config: &BanditConfig) -> Result<Self> {
        if state.arms.len() != ARM_COUNT {
            return Err(EngineError::ArmCount {
                expected: ARM_COUNT,
                found: state.arms.len(),
            });
        }
        for (arm, model) in state.arms.iter().enumerate() {
            if model.a.len() != CONTEXT_DIM * CONTEXT_DIM {
                return Err(EngineError::Dimension {
                    arm,
                    expected: CONTEXT_DIM * CONTEXT_DIM,
                    found: model.a.len(),
                });
            }
            if model.b.len() != CONTEXT_DIM {
                return Err(EngineError::Dimension {
                    arm,
                    expected: CONTEXT_DIM,
                    found: model.b.len(),
                });
            }
        }
        for (arm, model) in state.arms.iter_mut().enumerate() {
            if has_invalid_values(&model.a) || has_invalid_values(&model.b) {
                tracing::warn!(arm, "restored arm has non-finite statistics, resetting");
                *model = ArmModel::new(CONTEXT_DIM);
            }
        }
        let mut bandit = Self::new(config);
        if state.alpha.is_finite() && state.alpha >= 0.0 {
            bandit.alpha = state.alpha;
        }
        bandit.arms = state.arms;
        Ok(bandit)
    }

    pub fn state(&self) -> BanditState {
        BanditState {
            alpha: self.alpha,
            arms: self.arms.clone(),
        }
    }

    pub fn reset(&mut self) {
        self.arms = (0..ARM_COUNT).map(|_| ArmModel::new(CONTEXT_DIM)).collect();
        self.rng = make_rng(self.seed);
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn plays(&self, arm: usize) -> Option<u32> {
        self.arms.get(arm).map(|m| m.plays)
    }

    pub fn theta(&self, arm: usize) -> Option<Vec<f64>> {
        self.arms.get(arm).map(|m| m.theta().0)
    }

    pub fn select_arm(&mut self, ctx: &ArmContext) -> ArmSelection {
        let x = ctx.as_slice();

        let unplayed: Vec<usize> = (0..self.arms.len())
            .filter(|&i| self.arms[i].plays == 0)
            .collect();
        if let Some(&arm) = unplayed.choose(&mut self.rng) {
            tracing::debug!(arm, candidates = unplayed.len(), "forced exploration");
            return ArmSelection {
                arm,
                forced: true,
                expected: 0.0,
                confidence: 0.0,
                score: 0.0,
                all_scores: vec![],
            };
        }

        let stats: Vec<UcbStats> = self.arms.iter().map(|m| m.ucb(x, self.alpha)).collect();
        if stats.iter().any(|s| s.singular) {
            tracing::warn!("singular arm covariance, using identity inverse");
        }

        let best = stats
            .iter()
            .map(|s| s.score)
            .filter(|s| s.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = stats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.score.is_finite() && s.score >= best - self.tie_epsilon)
            .map(|(i, _)| i)
            .collect();
        let arm = tied.choose(&mut self.rng).copied().unwrap_or(1);
        let chosen = stats[arm];

        ArmSelection {
            arm,
            forced: false,
            expected: chosen.expected,
            confidence: chosen.confidence,
            score: chosen.score,
            all_scores: stats.iter().map(|s| s.score).collect(),
        }
    }

    /// Credit `reward` to `arm` under `ctx`. Returns `false` (and changes
    /// nothing) for an unknown arm or a non-finite reward.
    pub fn update(&mut self, arm: usize, ctx: &ArmContext, reward: f64) -> bool {
        if !reward.is_finite() {
            tracing::warn!(arm, reward, "ignoring non-finite bandit reward");
            return false;
        }
        let Some(model) = self.arms.get_mut(arm) else {
            tracing::warn!(arm, "ignoring update for unknown arm");
            return false;
        };
        let x = ctx.as_slice();
        rank1_update_matrix(&mut model.a, x, CONTEXT_DIM);
        vec_add_scaled(&mut model.b, x, reward);
        model.plays += 1;
        true
    }

    /// Base preset for `arm` at `level`. Pure: same inputs, same output.
    pub fn config_for(&self, arm: usize, level: u8) -> GameConfiguration {
        base_config(arm, level)
    }

    pub fn diagnose(&self) -> Vec<ArmDiagnostics> {
        self.arms
            .iter()
            .map(|m| {
                let (theta, singular) = m.theta();
                ArmDiagnostics {
                    plays: m.plays,
                    theta,
                    symmetric: is_symmetric(&m.a, CONTEXT_DIM, 1e-9),
                    singular,
                }
            })
            .collect()
    }
}

impl Default for Bandit {
    fn default() -> Self {
        Self::new(&BanditConfig::default())
    }
}

fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn base_config(arm: usize, level: u8) -> GameConfiguration {
    let arm = arm.min(ARM_COUNT - 1);
    let level = sanitize_level(level);
    let (grid_cols, grid_rows) = pacing::default_grid(arm, level).dims();
    let total_pairs = pacing::total_pairs(grid_cols, grid_rows);

    let mut config = GameConfiguration {
        level,
        arm,
        initial_time: pacing::initial_time(level, total_pairs, arm),
        match_reward: pacing::match_reward(arm),
        hide_delay: pacing::hide_delay(arm),
        show_scale: pacing::show_scale(arm),
        hint_policy: HintPolicy::for_arm(arm),
        grid_cols,
        grid_rows,
        total_pairs,
        hidden_level: 0,
        neighbor_mode: None,
        adjacent_rate: None,
        adjacent_target: None,
        pairs_type: None,
    };

    match level {
        2 => {
            let rate = pacing::ADJACENT_RATE_SEED[arm].clamp(0.2, 0.6);
            config.neighbor_mode = Some(true);
            config.adjacent_rate = Some(rate);
            config.adjacent_target = Some(pacing::adjacent_target(rate, total_pairs));
        }
        3 => config.pairs_type = Some(PairsType::for_arm(arm)),
        _ => {}
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::invert_gauss_jordan;

    fn ctx() -> ArmContext {
        ArmContext::new([1.0 / 3.0, 0.6, 0.2, 0.4, 0.1, 0.5, 0.0])
    }

    #[test]
    fn new_initializes_identity_and_zero() {
        let bandit = Bandit::with_seed(1);
        for model in &bandit.arms {
            assert_eq!(model.a, identity(CONTEXT_DIM));
            assert!(model.b.iter().all(|v| *v == 0.0));
            assert_eq!(model.plays, 0);
        }
    }

    #[test]
    fn forced_exploration_covers_every_arm() {
        let mut bandit = Bandit::with_seed(7);
        let c = ctx();
        let mut seen = [false; ARM_COUNT];
        for _ in 0..ARM_COUNT {
            let selection = bandit.select_arm(&c);
            assert!(selection.forced);
            assert!(!seen[selection.arm]);
            seen[selection.arm] = true;
            assert!(bandit.update(selection.arm, &c, 0.5));
        }
        assert!(seen.iter().all(|s| *s));
        assert!(!bandit.select_arm(&c).forced);
    }

    #[test]
    fn one_step_update_matches_closed_form() {
        let mut bandit = Bandit::with_seed(3);
        let c = ctx();
        let reward = 0.8;
        bandit.update(1, &c, reward);

        let x = c.as_slice();
        let norm_sq: f64 = x.iter().map(|v| v * v).sum();
        let theta = bandit.theta(1).unwrap();
        for (t, xi) in theta.iter().zip(x) {
            assert!((t - xi * reward / (1.0 + norm_sq)).abs() < 1e-10);
        }

        // Same answer through an explicit inverse.
        let inv = invert_gauss_jordan(&bandit.arms[1].a, CONTEXT_DIM).unwrap();
        let direct = mat_vec_mul(&inv, &bandit.arms[1].b, CONTEXT_DIM);
        for (a, b) in theta.iter().zip(direct) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn invalid_updates_are_ignored() {
        let mut bandit = Bandit::with_seed(3);
        let before = bandit.state();
        assert!(!bandit.update(3, &ctx(), 1.0));
        assert!(!bandit.update(0, &ctx(), f64::NAN));
        assert!(!bandit.update(0, &ctx(), f64::INFINITY));
        assert_eq!(bandit.state().arms, before.arms);
    }

    #[test]
    fn ucb_prefers_rewarded_arm() {
        let mut bandit = Bandit::with_seed(11);
        let c = ctx();
        for _ in 0..20 {
            bandit.update(0, &c, 0.1);
            bandit.update(1, &c, 0.9);
            bandit.update(2, &c, 0.2);
        }
        let selection = bandit.select_arm(&c);
        assert_eq!(selection.arm, 1);
        assert_eq!(selection.all_scores.len(), ARM_COUNT);
        assert!(selection.confidence > 0.0);
    }

    #[test]
    fn ties_are_broken_among_tied_arms_only() {
        let mut bandit = Bandit::with_seed(5);
        let c = ctx();
        bandit.update(0, &c, 1.0);
        bandit.update(1, &c, 1.0);
        bandit.update(2, &c, -1.0);
        let mut picked = [0usize; ARM_COUNT];
        for _ in 0..200 {
            picked[bandit.select_arm(&c).arm] += 1;
        }
        assert_eq!(picked[2], 0);
        assert!(picked[0] > 0 && picked[1] > 0);
    }

    #[test]
    fn a_stays_symmetric() {
        let mut bandit = Bandit::with_seed(9);
        for i in 0..10 {
            let v = i as f64 / 10.0;
            bandit.update(i % 3, &ArmContext::new([v, 1.0 - v, v * v, 0.3, 0.1, 0.2, 0.0]), v);
        }
        assert!(bandit.diagnose().iter().all(|d| d.symmetric && !d.singular));
    }

    #[test]
    fn config_for_is_pure() {
        let bandit = Bandit::with_seed(1);
        for arm in 0..ARM_COUNT {
            for level in 1..=3 {
                assert_eq!(bandit.config_for(arm, level), bandit.config_for(arm, level));
            }
        }
    }

    #[test]
    fn config_for_presets() {
        let easy = base_config(0, 2);
        assert_eq!(easy.hint_policy, HintPolicy::Generous);
        assert_eq!((easy.grid_cols, easy.grid_rows), (5, 4));
        assert_eq!(easy.total_pairs, 10);
        assert_eq!(easy.adjacent_rate, Some(0.6));
        assert_eq!(easy.adjacent_target, Some(6));

        let hard = base_config(2, 3);
        assert_eq!(hard.hint_policy, HintPolicy::Limited);
        assert_eq!((hard.grid_cols, hard.grid_rows), (6, 4));
        assert_eq!(hard.total_pairs, 12);
        assert_eq!(hard.pairs_type, Some(PairsType::Mixed));
        assert!(hard.adjacent_rate.is_none());

        let level_one = base_config(2, 1);
        assert_eq!((level_one.grid_cols, level_one.grid_rows), (5, 4));
        assert!(level_one.neighbor_mode.is_none());
    }

    #[test]
    fn from_state_rejects_bad_shapes() {
        let mut state = Bandit::with_seed(1).state();
        state.arms.pop();
        assert!(matches!(
            Bandit::from_state(state, &BanditConfig::default()),
            Err(EngineError::ArmCount { found: 2, .. })
        ));

        let mut state = Bandit::with_seed(1).state();
        state.arms[1].b.push(0.0);
        assert!(matches!(
            Bandit::from_state(state, &BanditConfig::default()),
            Err(EngineError::Dimension { arm: 1, .. })
        ));
    }

    #[test]
    fn from_state_resets_non_finite_arms() {
        let mut bandit = Bandit::with_seed(1);
        bandit.update(0, &ctx(), 0.5);
        bandit.update(1, &ctx(), 0.5);
        let mut state = bandit.state();
        state.arms[1].b[3] = f64::NAN;

        let restored = Bandit::from_state(state, &BanditConfig::default()).unwrap();
        assert_eq!(restored.plays(0), Some(1));
        assert_eq!(restored.plays(1), Some(0));
        assert_eq!(restored.arms[1], ArmModel::new(CONTEXT_DIM));
    }
}
