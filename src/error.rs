use thiserror::Error;

/// Errors surfaced when restoring persisted engine state. Telemetry never
/// produces an error; it degrades to neutral defaults instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot has {found} arms, expected {expected}")]
    ArmCount { expected: usize, found: usize },
    #[error("arm {arm} has malformed model: expected dimension {expected}, found {found}")]
    Dimension {
        arm: usize,
        expected: usize,
        found: usize,
    },
    #[error("snapshot level {0} is outside 1..=3")]
    Level(u8),
    #[error("snapshot session has invalid {field}")]
    Session { field: &'static str },
}

pub type Result<T> = std::result::Result<T, EngineError>;
