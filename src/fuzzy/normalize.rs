use std::collections::{BTreeMap, HashMap};

use super::palette;
use crate::config::ScorerConfig;
use crate::sanitize::clamp01;
use crate::types::{CategoryStats, NormalizedSignals, PerformanceMetrics};

const NEUTRAL: f64 = 0.5;

pub fn normalize(metrics: &PerformanceMetrics, config: &ScorerConfig) -> NormalizedSignals {
    NormalizedSignals {
        time: normalized_time(metrics, config),
        error_rate: error_rate(metrics),
        cadence_variance: cadence_variance(&metrics.flip_intervals),
        click_accuracy: click_accuracy(metrics),
        color_accuracy: category_accuracy(&metrics.color_stats),
        shape_accuracy: category_accuracy(&metrics.shape_stats),
    }
}

/// 0 is fast, 1 is at or beyond the expected time for the board.
pub fn normalized_time(metrics: &PerformanceMetrics, config: &ScorerConfig) -> f64 {
    let expected = config.per_pair_seconds(metrics.level) * metrics.total_pairs as f64;
    if expected.is_nan() || expected <= 0.0 {
        return NEUTRAL;
    }
    let elapsed = if metrics.completion_time.is_finite() && metrics.completion_time > 0.0 {
        metrics.completion_time
    } else {
        expected * 0.5
    };
    clamp01(elapsed / expected)
}

pub fn error_rate(metrics: &PerformanceMetrics) -> f64 {
    if metrics.total_matches == 0 {
        return NEUTRAL;
    }
    let failed = metrics.failed_matches.min(metrics.total_matches);
    failed as f64 / metrics.total_matches as f64
}

/// Coefficient of variation of the flip intervals, capped at 1.
pub fn cadence_variance(intervals: &[f64]) -> f64 {
    let valid: Vec<f64> = intervals
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    if valid.len() < 2 {
        return NEUTRAL;
    }
    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return NEUTRAL;
    }
    let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (variance.sqrt() / mean).min(1.0)
}

pub fn click_accuracy(metrics: &PerformanceMetrics) -> f64 {
    if metrics.total_clicks == 0 {
        return NEUTRAL;
    }
    let successful = metrics.successful_matches() as f64;
    (2.0 * successful / metrics.total_clicks as f64).min(1.0)
}

pub fn category_accuracy(stats: &HashMap<String, CategoryStats>) -> f64 {
    let (attempts, successes) = stats.values().fold((0u64, 0u64), |(a, s), cat| {
        (a + cat.attempts as u64, s + cat.effective_successes() as u64)
    });
    if attempts == 0 {
        return NEUTRAL;
    }
    successes as f64 / attempts as f64
}

/// Accuracy per base colour family. Families without attempts are omitted.
pub fn color_sensitivity(stats: &HashMap<String, CategoryStats>) -> BTreeMap<String, f64> {
    let mut families: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (label, cat) in stats {
        let entry = families.entry(palette::base_family(label)).or_default();
        entry.0 += cat.attempts as u64;
        entry.1 += cat.effective_successes() as u64;
    }
    families
        .into_iter()
        .filter(|(_, (attempts, _))| *attempts > 0)
        .map(|(family, (attempts, successes))| (family, successes as f64 / attempts as f64))
        .collect()
}

/// Multiplier in `[1 - max_penalty, 1]`; exactly 1 without cheats.
pub fn cheat_penalty(metrics: &PerformanceMetrics, config: &ScorerConfig) -> f64 {
    if metrics.cheat_count == 0 {
        return 1.0;
    }
    let cap = config.max_cheat_penalty;
    let ratio = metrics.cheat_count as f64 / metrics.total_pairs.max(1) as f64;
    1.0 - cap.min(cap * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> PerformanceMetrics {
        PerformanceMetrics {
            level: 1,
            total_pairs: 10,
            ..Default::default()
        }
    }

    #[test]
    fn time_substitutes_half_expected_when_missing() {
        let config = ScorerConfig::default();
        let mut m = metrics();
        m.completion_time = 0.0;
        assert_eq!(normalized_time(&m, &config), 0.5);
        m.completion_time = f64::NAN;
        assert_eq!(normalized_time(&m, &config), 0.5);
        m.completion_time = 100.0;
        assert_eq!(normalized_time(&m, &config), 0.5);
        m.completion_time = 1000.0;
        assert_eq!(normalized_time(&m, &config), 1.0);
    }

    #[test]
    fn time_is_neutral_without_pairs() {
        let config = ScorerConfig::default();
        let mut m = metrics();
        m.total_pairs = 0;
        m.completion_time = 12.0;
        assert_eq!(normalized_time(&m, &config), 0.5);
    }

    #[test]
    fn error_rate_defaults() {
        let mut m = metrics();
        assert_eq!(error_rate(&m), 0.5);
        m.total_matches = 8;
        m.failed_matches = 2;
        assert_eq!(error_rate(&m), 0.25);
        m.failed_matches = 20;
        assert_eq!(error_rate(&m), 1.0);
    }

    #[test]
    fn cadence_variance_cases() {
        assert_eq!(cadence_variance(&[]), 0.5);
        assert_eq!(cadence_variance(&[400.0]), 0.5);
        assert_eq!(cadence_variance(&[500.0, 500.0, 500.0]), 0.0);
        // mean 200, population std 100
        let cv = cadence_variance(&[100.0, 300.0]);
        assert!((cv - 0.5).abs() < 1e-12);
        assert_eq!(cadence_variance(&[0.0, 10_000.0, 0.0, 0.0, 0.0, 0.0]), 1.0);
        assert_eq!(cadence_variance(&[f64::NAN, 300.0]), 0.5);
    }

    #[test]
    fn click_accuracy_cases() {
        let mut m = metrics();
        assert_eq!(click_accuracy(&m), 0.5);
        m.total_matches = 10;
        m.total_clicks = 20;
        assert_eq!(click_accuracy(&m), 1.0);
        m.failed_matches = 5;
        assert_eq!(click_accuracy(&m), 0.5);
    }

    #[test]
    fn category_accuracy_aggregates() {
        let mut stats = HashMap::new();
        assert_eq!(category_accuracy(&stats), 0.5);
        stats.insert("red".to_string(), CategoryStats::new(4, 3));
        stats.insert("blue".to_string(), CategoryStats::new(6, 9));
        assert!((category_accuracy(&stats) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn color_sensitivity_groups_by_base_family() {
        let mut stats = HashMap::new();
        stats.insert("apple".to_string(), CategoryStats::new(4, 4));
        stats.insert("scarlet".to_string(), CategoryStats::new(4, 0));
        stats.insert("whale".to_string(), CategoryStats::new(2, 1));
        stats.insert("teal".to_string(), CategoryStats::new(0, 0));
        let sensitivity = color_sensitivity(&stats);
        assert_eq!(sensitivity.len(), 2);
        assert_eq!(sensitivity["red"], 0.5);
        assert_eq!(sensitivity["blue"], 0.5);
    }

    #[test]
    fn cheat_penalty_bounds() {
        let config = ScorerConfig::default();
        let mut m = metrics();
        assert_eq!(cheat_penalty(&m, &config), 1.0);
        m.cheat_count = 10;
        assert_eq!(cheat_penalty(&m, &config), 0.5);
        m.cheat_count = 40;
        assert_eq!(cheat_penalty(&m, &config), 0.5);
        m.cheat_count = 3;
        assert!((cheat_penalty(&m, &config) - 0.85).abs() < 1e-12);
    }
}
