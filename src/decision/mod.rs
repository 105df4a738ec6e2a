pub mod coldstart;
pub mod linucb;
pub mod pacing;

pub use coldstart::initial_difficulty;
pub use linucb::{ArmContext, ArmSelection, Bandit, BanditState, CONTEXT_DIM};
