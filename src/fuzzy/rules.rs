use super::membership::Memberships;

pub const RULE_COUNT: usize = 16;

/// Activation and weight of one fired rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutput {
    pub activation: f64,
    pub weight: f64,
}

fn and(values: &[f64]) -> f64 {
    values.iter().copied().fold(1.0, f64::min)
}

/// Evaluate the fixed rule base. `perfect_matching` selects the weight of
/// rule 2 (no failed matches at all).
pub fn evaluate(m: &Memberships, perfect_matching: bool) -> [RuleOutput; RULE_COUNT] {
    let rule = |activation: f64, weight: f64| RuleOutput { activation, weight };
    let rule2_weight = if perfect_matching { 1.0 } else { 0.95 };

    [
        rule(and(&[m.time_medium, m.error_low, m.cadence_stable]), 0.90),
        rule(and(&[m.time_fast, m.error_low, m.cadence_stable]), rule2_weight),
        rule(and(&[m.time_medium, m.error_medium, m.cadence_stable]), 0.60),
        rule(and(&[m.time_slow, m.error_low]), 0.60),
        rule(and(&[m.time_fast, m.error_high]), 0.30),
        rule(and(&[m.time_slow, m.error_high]), 0.10),
        rule(and(&[m.error_high, m.cadence_variable]), 0.20),
        rule(
            and(&[m.time_medium, m.error_low, m.color_high, m.shape_high]),
            0.98,
        ),
        rule(and(&[m.time_medium, m.color_low.max(m.shape_low)]), 0.35),
        rule(and(&[m.click_high, m.cadence_stable]), 0.95),
        rule(and(&[m.click_low, m.color_low]), 0.20),
        rule(and(&[m.time_fast, m.error_medium]), 0.85),
        rule(and(&[m.time_fast, m.error_low]), 0.97),
        rule(and(&[m.time_fast, m.error_low, m.click_high]), 1.0),
        rule(and(&[m.time_fast, m.error_low, m.cadence_variable]), 0.95),
        rule(and(&[m.time_medium, m.error_low]), 0.80),
    ]
}

/// Weighted average over rules with non-zero activation, `None` if nothing fired.
pub fn defuzzify(outputs: &[RuleOutput]) -> Option<f64> {
    let (num, den) = outputs
        .iter()
        .filter(|r| r.activation > 0.0)
        .fold((0.0, 0.0), |(num, den), r| {
            (num + r.activation * r.weight, den + r.activation)
        });
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}
