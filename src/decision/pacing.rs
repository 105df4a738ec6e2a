//! Deterministic pacing rules layered on top of the bandit's arm choice:
//! base presets per arm, grid sizing, level-2 adjacency and hidden-level timing.

use crate::config::PacingConfig;
use crate::sanitize::{clamp01, limit_delta, limit_step};
use crate::types::{sanitize_level, GridSize, PlayerProfile, Round, ARM_COUNT, MAX_HIDDEN_LEVEL};

pub const BASE_MATCH_REWARD: f64 = 3.0;
pub const BASE_HIDE_DELAY_MS: f64 = 800.0;
pub const BASE_SHOW_SCALE: f64 = 1.6;
pub const MIN_MATCH_REWARD: f64 = 1.0;
pub const MIN_HIDE_DELAY_MS: f64 = 200.0;
pub const MIN_SHOW_SCALE: f64 = 1.1;
pub const MIN_INITIAL_TIME: f64 = 30.0;
pub const SECONDS_PER_PAIR: [f64; 3] = [20.0, 15.0, 12.0];
pub const ADJACENT_RATE_SEED: [f64; ARM_COUNT] = [0.6, 0.4, 0.2];

/// 0 for the easiest arm, 1 for the hardest.
pub fn difficulty_multiplier(arm: usize) -> f64 {
    arm.min(ARM_COUNT - 1) as f64 / (ARM_COUNT - 1) as f64
}

pub fn match_reward(arm: usize) -> u32 {
    let mult = difficulty_multiplier(arm);
    (BASE_MATCH_REWARD * (1.0 - 0.3 * mult))
        .round()
        .max(MIN_MATCH_REWARD) as u32
}

pub fn hide_delay(arm: usize) -> u32 {
    let mult = difficulty_multiplier(arm);
    (BASE_HIDE_DELAY_MS * (1.0 - 0.4 * mult))
        .round()
        .max(MIN_HIDE_DELAY_MS) as u32
}

pub fn show_scale(arm: usize) -> f64 {
    let mult = difficulty_multiplier(arm);
    (BASE_SHOW_SCALE * (1.0 - 0.25 * mult)).max(MIN_SHOW_SCALE)
}

/// Round time budget in seconds for a board of `pairs` pairs.
pub fn initial_time(level: u8, pairs: u32, arm: usize) -> u32 {
    let per_pair = SECONDS_PER_PAIR[sanitize_level(level) as usize - 1];
    let mult = difficulty_multiplier(arm);
    (per_pair * pairs as f64 * (1.0 - 0.2 * mult))
        .round()
        .max(MIN_INITIAL_TIME) as u32
}

pub fn total_pairs(cols: u32, rows: u32) -> u32 {
    cols.saturating_mul(rows) / 2
}

/// Grid preferred by an arm before the grid policy overrides it.
pub fn default_grid(arm: usize, level: u8) -> GridSize {
    if arm >= 2 && sanitize_level(level) >= 2 {
        GridSize::Large
    } else {
        GridSize::Small
    }
}

/// Upgrade on one strong round, downgrade only on a sustained slump, hold
/// otherwise. `recent` is oldest first.
pub fn should_use_large_grid(
    profile: &PlayerProfile,
    recent: &[Round],
    currently_large: bool,
    config: &PacingConfig,
) -> bool {
    let Some(last) = recent.last() else {
        return currently_large;
    };

    if !currently_large {
        return last.flow_index >= config.large_grid_upgrade_flow;
    }

    let window = config.downgrade_window.max(1);
    let struggling = recent.len() >= window
        && recent[recent.len() - window..]
            .iter()
            .all(|round| round.flow_index < config.large_grid_downgrade_flow);
    let downgrade = profile.avg_flow < config.large_grid_downgrade_flow && struggling;
    !downgrade
}

/// Level-2 adjacency bucket: struggling players get more neighbouring pairs.
pub fn adjacent_rate_for_flow(flow: f64) -> f64 {
    if flow < 0.45 {
        0.6
    } else if flow < 0.75 {
        0.4
    } else {
        0.2
    }
}

pub fn next_adjacent_rate(target: f64, previous: Option<f64>, config: &PacingConfig) -> f64 {
    limit_delta(target, previous, config.adjacent_rate_step)
        .max(config.adjacent_rate_min)
        .min(config.adjacent_rate_max)
}

pub fn adjacent_target(rate: f64, pairs: u32) -> u32 {
    let target = (rate * pairs as f64).round();
    if target.is_nan() || target <= 0.0 {
        0
    } else {
        (target as u32).min(pairs)
    }
}

/// Raw ordinal of a smoothed hidden difficulty, before hysteresis.
pub fn hidden_level_for(hidden_difficulty: f64) -> u8 {
    (clamp01(hidden_difficulty) * MAX_HIDDEN_LEVEL as f64)
        .round()
        .clamp(0.0, MAX_HIDDEN_LEVEL as f64) as u8
}

/// Hidden level limited to one step from the previous round.
pub fn step_hidden_level(raw: u8, previous: Option<u8>) -> u8 {
    limit_step(raw as i64, previous.map(i64::from), 1).clamp(0, MAX_HIDDEN_LEVEL as i64) as u8
}

/// Arm limited to one step from the previous round and clamped to valid arms.
pub fn step_arm(raw: usize, previous: Option<usize>) -> usize {
    limit_step(raw as i64, previous.map(|p| p as i64), 1).clamp(0, ARM_COUNT as i64 - 1) as usize
}

/// `(hide_delay_ms, show_scale)` for a hidden level; levels past the table
/// reuse its last entry.
pub fn hidden_timing(hidden_level: u8, config: &PacingConfig) -> Option<(u32, f64)> {
    let delay = config
        .hidden_hide_delay
        .get(hidden_level as usize)
        .or_else(|| config.hidden_hide_delay.last())?;
    let scale = config
        .hidden_show_scale
        .get(hidden_level as usize)
        .or_else(|| config.hidden_show_scale.last())?;
    Some((*delay, *scale))
}
