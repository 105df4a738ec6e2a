use crate::types::{InitialSignals, MAX_LEVEL, MIN_LEVEL};

/// Starting level for a new session: one above a returning player's best,
/// level 1 for everyone else.
pub fn initial_difficulty(signals: &InitialSignals) -> u8 {
    if !signals.has_played_before {
        return MIN_LEVEL;
    }
    match signals.previous_best_level {
        Some(best) if best >= MIN_LEVEL => best.saturating_add(1).min(MAX_LEVEL),
        _ => MIN_LEVEL,
    }
}
