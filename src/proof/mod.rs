//! Fairness Proofs
//!
//! Commit-reveal rounds and the ledger that lets any of them be re-checked.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - HMAC-SHA3-256 commit / disclose / verify │
//! │  combine.rs      - (committed + contribution) mod N         │
//! │  ledger.rs       - Append-only record of disclosed rounds   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod combine;
pub mod commitment;
pub mod ledger;

pub use combine::{combine, CombineError};
pub use commitment::{commit, verify, Commitment, Disclosure, KeyError, MacDigest};
pub use ledger::{LedgerError, LedgerExport, LedgerRecord, VerificationLedger, VerificationOutcome};
