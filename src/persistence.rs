use serde::{Deserialize, Serialize};

use crate::decision::linucb::{Bandit, BanditState};
use crate::engine::AdaptiveEngine;
use crate::error::{EngineError, Result};
use crate::types::{
    PlayerProfile, SessionState, ARM_COUNT, MAX_HIDDEN_LEVEL, MAX_LEVEL, MIN_LEVEL,
};

/// Everything needed to resume a session on another host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub profile: PlayerProfile,
    pub session: SessionState,
    pub bandit: BanditState,
    #[serde(default)]
    pub saved_at: i64,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl AdaptiveEngine {
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            profile: self.profile().clone(),
            session: self.session().clone(),
            bandit: self.bandit().state(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Replace profile, session and bandit with `snapshot`. On error the engine
    /// is left untouched.
    pub fn restore(&mut self, snapshot: EngineSnapshot) -> Result<()> {
        let level = snapshot.session.current_level;
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(EngineError::Level(level));
        }
        validate_session(&snapshot.session)?;
        let bandit = Bandit::from_state(snapshot.bandit, &self.config().bandit)?;
        tracing::info!(
            rounds = snapshot.session.rounds_played(),
            level,
            saved_at = snapshot.saved_at,
            "engine state restored"
        );
        self.replace_state(snapshot.profile, snapshot.session, bandit);
        Ok(())
    }
}

/// Session memories feed the next configuration directly, so anything that
/// could push it out of range is refused.
fn validate_session(session: &SessionState) -> Result<()> {
    let invalid = |field: &'static str| -> Result<()> { Err(EngineError::Session { field }) };
    if session.last_hidden_level.is_some_and(|h| h > MAX_HIDDEN_LEVEL) {
        return invalid("lastHiddenLevel");
    }
    if session.last_arm.is_some_and(|arm| arm >= ARM_COUNT) {
        return invalid("lastArm");
    }
    if session.pending.as_ref().is_some_and(|p| p.arm >= ARM_COUNT) {
        return invalid("pending.arm");
    }
    if session
        .last_adjacent_rate
        .is_some_and(|rate| !rate.is_finite() || !(0.0..=1.0).contains(&rate))
    {
        return invalid("lastAdjacentRate");
    }
    Ok(())
}
