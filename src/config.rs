//! Game Configuration
//!
//! Defaults, then environment variables, then command line flags
//! (applied by the binary).

use std::path::PathBuf;

use thiserror::Error;

use crate::core::dice::{parse_dice, DiceConfigError, DiceRules, Die, MIN_DICE};
use crate::game::session::InputPolicy;

/// Environment variable enforcing a face count.
pub const ENV_FACES: &str = "FAIR_DICE_FACES";
/// Environment variable selecting the strict input policy.
pub const ENV_STRICT: &str = "FAIR_DICE_STRICT";
/// Environment variable naming the ledger export file.
pub const ENV_LEDGER_OUT: &str = "FAIR_DICE_LEDGER_OUT";

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Raw dice specs, e.g. `2,2,4,4,9,9`.
    pub dice_specs: Vec<String>,
    /// Exact face count to enforce, if any.
    pub face_count: Option<usize>,
    /// Minimum dice count (never below [`MIN_DICE`]).
    pub min_dice: usize,
    /// Invalid-input policy for game prompts.
    pub policy: InputPolicy,
    /// Where to write the ledger export after the session.
    pub ledger_out: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dice_specs: Vec::new(),
            face_count: None,
            min_dice: MIN_DICE,
            policy: InputPolicy::Reprompt,
            ledger_out: None,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_FACES) {
            let faces = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| ConfigError::InvalidVar {
                    name: ENV_FACES,
                    value: raw.clone(),
                })?;
            config.face_count = Some(faces);
        }

        if let Some(raw) = lookup(ENV_STRICT) {
            config.policy = match raw.trim() {
                "1" | "true" => InputPolicy::Strict,
                "0" | "false" | "" => InputPolicy::Reprompt,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: ENV_STRICT,
                        value: raw,
                    })
                }
            };
        }

        if let Some(path) = lookup(ENV_LEDGER_OUT).filter(|p| !p.trim().is_empty()) {
            config.ledger_out = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Validation rules derived from this config.
    pub fn dice_rules(&self) -> DiceRules {
        DiceRules {
            min_dice: self.min_dice.max(MIN_DICE),
            face_count: self.face_count,
        }
    }

    /// Parse and validate the configured dice.
    pub fn dice(&self) -> Result<Vec<Die>, DiceConfigError> {
        parse_dice(&self.dice_specs, &self.dice_rules())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Environment variable has an unusable value.
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}
