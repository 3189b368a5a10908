//! Secure Random Draws
//!
//! Unbiased integers in `[0, N)` from a cryptographic byte source.
//!
//! Draws use rejection sampling: a raw draw is accepted only below the
//! largest multiple of `N` that fits the draw width, then reduced mod `N`.
//! Plain `byte % N` would favour small residues whenever `256 % N != 0`.
//!
//! All functions take the generator explicitly. Production code passes
//! [`rand::rngs::OsRng`]; the `CryptoRng` bound keeps non-cryptographic
//! generators out of the commitment path.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

/// Secret key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Secret key for a single commitment round.
pub type SecretKey = [u8; KEY_LEN];

/// Errors for invalid draw ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// `N == 0` has no values to draw from.
    #[error("random range must contain at least one value")]
    Empty,
}

/// Generate a fresh 32-byte secret key.
pub fn generate_key<R: RngCore + CryptoRng>(rng: &mut R) -> SecretKey {
    let mut key = [0u8; KEY_LEN];
    rng.fill_bytes(&mut key);
    key
}

/// Draw a uniformly distributed integer in `[0, range)`.
///
/// For `range <= 256` each attempt consumes exactly one byte with
/// `max = floor(256 / range) * range`. Wider ranges read the minimal number
/// of big-endian bytes that cover `range`.
///
/// # Example
///
/// ```
/// use fair_dice::core::rng::secure_random_in_range;
///
/// let value = secure_random_in_range(&mut rand::rngs::OsRng, 6).unwrap();
/// assert!(value < 6);
/// ```
pub fn secure_random_in_range<R: RngCore + CryptoRng>(rng: &mut R, range: u32) -> Result<u32, RangeError> {
    if range == 0 {
        return Err(RangeError::Empty);
    }

    let width = draw_width(range);
    let space = 1u64 << (8 * width);
    let range = u64::from(range);
    let limit = (space / range) * range;

    let mut buf = [0u8; 4];
    loop {
        rng.fill_bytes(&mut buf[..width]);
        let raw = buf[..width]
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));

        if raw < limit {
            return Ok((raw % range) as u32);
        }
    }
}

/// Bytes per attempt needed to cover `range` values.
#[inline]
fn draw_width(range: u32) -> usize {
    let range = u64::from(range);
    let mut width = 1;
    while (1u64 << (8 * width)) < range {
        width += 1;
    }
    width
}


// =============================================================================
// TESTS
// =============================================================================
