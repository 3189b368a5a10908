//! Dice Definitions
//!
//! A die is an immutable, ordered list of signed face values.
//! Dice sets come from the command line as comma-separated specs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of dice in a game (a non-transitive cycle needs three).
pub const MIN_DICE: usize = 3;

/// A die with arbitrary integer faces.
///
/// Faces keep their input order; a throw resolves an index into this list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    faces: Vec<i64>,
}

impl Die {
    /// Create a die from its faces. At least one face is required.
    pub fn new(faces: Vec<i64>) -> Result<Self, DiceConfigError> {
        if faces.is_empty() {
            return Err(DiceConfigError::NoFaces);
        }
        Ok(Self { faces })
    }

    /// Face value at `index`, if in range.
    #[inline]
    pub fn face(&self, index: usize) -> Option<i64> {
        self.faces.get(index).copied()
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// All faces in order.
    pub fn faces(&self) -> &[i64] {
        &self.faces
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, face) in self.faces.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", face)?;
        }
        f.write_str("]")
    }
}

impl FromStr for Die {
    type Err = DiceConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(DiceConfigError::NoFaces);
        }

        let faces = spec
            .split(',')
            .map(|raw| {
                let raw = raw.trim();
                raw.parse::<i64>()
                    .map_err(|_| DiceConfigError::InvalidFace(raw.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(faces)
    }
}

/// Validation rules applied when parsing a dice set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiceRules {
    /// Minimum number of dice (clamped to [`MIN_DICE`]).
    pub min_dice: usize,
    /// Exact face count every die must have, if enforced.
    pub face_count: Option<usize>,
}

impl Default for DiceRules {
    fn default() -> Self {
        Self {
            min_dice: MIN_DICE,
            face_count: None,
        }
    }
}

/// Parse a dice set from command line specs such as `2,2,4,4,9,9`.
pub fn parse_dice<S: AsRef<str>>(specs: &[S], rules: &DiceRules) -> Result<Vec<Die>, DiceConfigError> {
    let min_dice = rules.min_dice.max(MIN_DICE);
    if specs.len() < min_dice {
        return Err(DiceConfigError::TooFewDice {
            required: min_dice,
            got: specs.len(),
        });
    }

    let mut dice = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let die: Die = spec.as_ref().parse()?;

        if let Some(expected) = rules.face_count {
            if die.face_count() != expected {
                return Err(DiceConfigError::FaceCountMismatch {
                    die: index,
                    expected,
                    got: die.face_count(),
                });
            }
        }

        dice.push(die);
    }

    Ok(dice)
}

/// Dice set configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceConfigError {
    /// Not enough dice supplied.
    #[error("at least {required} dice required, got {got}")]
    TooFewDice {
        /// Minimum dice count.
        required: usize,
        /// Dice count supplied.
        got: usize,
    },

    /// A face is not an integer.
    #[error("invalid face value: {0:?}")]
    InvalidFace(String),

    /// A die spec has no faces.
    #[error("a die must have at least one face")]
    NoFaces,

    /// A die does not have the enforced face count.
    #[error("die #{die} has {got} faces, expected {expected}")]
    FaceCountMismatch {
        /// Zero-based position of the die.
        die: usize,
        /// Enforced face count.
        expected: usize,
        /// Actual face count.
        got: usize,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_die() {
        let die: Die = "2,2,4,4,9,9".parse().unwrap();
        assert_eq!(die.faces(), &[2, 2, 4, 4, 9, 9]);
        assert_eq!(die.face_count(), 6);
        assert_eq!(die.to_string(), "[2,2,4,4,9,9]");
    }

    #[test]
    fn test_parse_die_negative_and_spaces() {
        let die: Die = " -3, 0 ,7 ".parse().unwrap();
        assert_eq!(die.faces(), &[-3, 0, 7]);
    }

    #[test]
    fn test_parse_die_invalid_face() {
        let err = "1,two,3".parse::<Die>().unwrap_err();
        assert_eq!(err, DiceConfigError::InvalidFace("two".to_string()));

        // Trailing comma leaves an empty face
        assert!(matches!("1,2,".parse::<Die>(), Err(DiceConfigError::InvalidFace(_))));
    }

    #[test]
    fn test_empty_die() {
        assert_eq!("".parse::<Die>(), Err(DiceConfigError::NoFaces));
        assert_eq!(Die::new(vec![]), Err(DiceConfigError::NoFaces));
    }

    #[test]
    fn test_face_lookup() {
        let die = Die::new(vec![1, 6, 8]).unwrap();
        assert_eq!(die.face(0), Some(1));
        assert_eq!(die.face(2), Some(8));
        assert_eq!(die.face(3), None);
    }

    #[test]
    fn test_parse_dice_set() {
        let specs = ["2,2,4,4,9,9", "1,1,6,6,8,8", "3,3,5,5,7,7"];
        let dice = parse_dice(&specs, &DiceRules::default()).unwrap();
        assert_eq!(dice.len(), 3);
        assert_eq!(dice[1].face(2), Some(6));
    }

    #[test]
    fn test_too_few_dice() {
        let specs = ["1,2,3", "4,5,6"];
        let err = parse_dice(&specs, &DiceRules::default()).unwrap_err();
        assert_eq!(err, DiceConfigError::TooFewDice { required: 3, got: 2 });
    }

    #[test]
    fn test_min_dice_never_below_three() {
        let rules = DiceRules { min_dice: 1, face_count: None };
        let specs = ["1,2,3", "4,5,6"];
        assert!(matches!(
            parse_dice(&specs, &rules),
            Err(DiceConfigError::TooFewDice { required: 3, .. })
        ));
    }

    #[test]
    fn test_face_count_enforced() {
        let rules = DiceRules {
            min_dice: MIN_DICE,
            face_count: Some(6),
        };
        let specs = ["1,2,3,4,5,6", "1,2,3,4,5", "1,2,3,4,5,6"];
        let err = parse_dice(&specs, &rules).unwrap_err();
        assert_eq!(
            err,
            DiceConfigError::FaceCountMismatch { die: 1, expected: 6, got: 5 }
        );
    }

    #[test]
    fn test_mixed_face_counts_allowed_by_default() {
        let specs = ["1,2", "3,4,5", "6"];
        let dice = parse_dice(&specs, &DiceRules::default()).unwrap();
        let counts: Vec<usize> = dice.iter().map(Die::face_count).collect();
        assert_eq!(counts, vec![2, 3, 1]);
    }
}
