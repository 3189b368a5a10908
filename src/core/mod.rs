//! Core primitives.
//!
//! Dice definitions and the secure random draws every commit round uses.

pub mod dice;
pub mod rng;

pub use dice::{parse_dice, DiceConfigError, DiceRules, Die};
pub use rng::{generate_key, secure_random_in_range, RangeError, SecretKey};
