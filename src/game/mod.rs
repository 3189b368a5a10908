//! Game Logic Module
//!
//! ## Module Structure
//!
//! - `probability`: Exact pairwise win odds for the help screen
//! - `session`: Phase-by-phase orchestration of one game

pub mod probability;
pub mod session;

// Re-export key types
pub use probability::{compute_matrix, win_probability, ProbabilityMatrix, WinProbability};
pub use session::{
    GameResult, GameSession, InputPolicy, Party, Presenter, PresenterError, Prompt, SessionEnd, SessionError,
    SessionEvent, SessionPhase,
};
