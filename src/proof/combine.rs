//! Commit + Contribution Combiner
//!
//! Folds the committed value and the counterpart's value into one index.
//! With the committed operand uniform on `[0, N)`, `(c + h) mod N` is
//! uniform for every fixed `h`: adding `h` only permutes the residues.

use thiserror::Error;

/// Inputs outside the combiner's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CombineError {
    /// `N == 0`.
    #[error("combine range must be at least 1")]
    EmptyRange,

    /// An operand is not in `[0, N)`.
    #[error("operand {value} is outside 0..{range}")]
    OutOfRange {
        /// Offending operand.
        value: u32,
        /// Exclusive bound.
        range: u32,
    },
}

/// Compute `(committed + contribution) mod range`.
pub fn combine(committed: u32, contribution: u32, range: u32) -> Result<u32, CombineError> {
    if range == 0 {
        return Err(CombineError::EmptyRange);
    }
    for value in [committed, contribution] {
        if value >= range {
            return Err(CombineError::OutOfRange { value, range });
        }
    }

    let sum = u64::from(committed) + u64::from(contribution);
    Ok((sum % u64::from(range)) as u32)
}
