//! Adaptive difficulty for a timed card-matching game.
//!
//! Each finished round is scored by a fuzzy-inference [`FlowScorer`] into a
//! Flow Index in `[0,1]`. The [`AdaptiveEngine`] folds that into a smoothed
//! [`PlayerProfile`], rewards the LinUCB [`Bandit`] arm that configured the
//! round, and builds the next [`GameConfiguration`] from the arm's preset plus
//! grid, adjacency and hidden-level pacing rules.
//!
//! ```no_run
//! use flow_engine::{AdaptiveEngine, EngineConfig, InitialSignals, PerformanceMetrics};
//!
//! let mut engine = AdaptiveEngine::new(EngineConfig::from_env());
//! let level = engine.initial_difficulty(&InitialSignals::default());
//! let config = engine.decide_next_config(level);
//! # let metrics = PerformanceMetrics { level: config.level, ..Default::default() };
//! let outcome = engine.advance(&metrics, level);
//! println!("flow {:.2}, next arm {}", outcome.flow_index, outcome.config.arm);
//! ```

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod logging;
pub mod matrix;
pub mod persistence;
pub mod sanitize;
pub mod types;

pub use config::{BanditConfig, EngineConfig, PacingConfig, ScorerConfig, SmoothingConfig};
pub use decision::{initial_difficulty, ArmContext, ArmSelection, Bandit, BanditState};
pub use engine::{AdaptiveEngine, RoundOutcome};
pub use error::{EngineError, Result};
pub use fuzzy::FlowScorer;
pub use persistence::EngineSnapshot;
pub use types::*;
