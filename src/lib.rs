//! # Fair Dice
//!
//! Provably fair non-transitive dice game between a human and the computer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FAIR DICE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── dice.rs     - Dice and dice-set parsing                 │
//! │  └── rng.rs      - Unbiased secure draws in [0, N)           │
//! │                                                              │
//! │  proof/          - Commit-reveal fairness                    │
//! │  ├── commitment.rs - HMAC-SHA3-256 commitments               │
//! │  ├── combine.rs  - Modular combination of both inputs        │
//! │  └── ledger.rs   - Verification ledger and audit export      │
//! │                                                              │
//! │  game/           - Game logic                                │
//! │  ├── probability.rs - Win probability matrix                 │
//! │  └── session.rs  - Orchestration state machine               │
//! │                                                              │
//! │  terminal/       - Text prompts and tables (I/O only)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! For every disputed draw the computer publishes a digest before the human
//! answers, and reveals the key afterwards:
//! - The committed value is uniform on `[0, N)` (rejection sampling)
//! - `(committed + contribution) mod N` stays uniform whatever the human picks
//! - Every disclosed round stays in the session ledger for re-verification

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod proof;
pub mod terminal;

// Re-export commonly used types
pub use crate::core::dice::Die;
pub use crate::game::session::{GameSession, SessionEnd};
pub use crate::proof::commitment::{commit, verify, Commitment};
pub use crate::proof::ledger::{VerificationLedger, VerificationOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
