//! Win Probabilities
//!
//! Exact head-to-head odds between dice. A face wins only when strictly
//! greater; ties count for neither side, which is what lets a
//! non-transitive set beat itself in a cycle.

use std::fmt;

use crate::core::dice::Die;

/// Exact probability as a reduced fraction `wins / total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WinProbability {
    wins: u64,
    total: u64,
}

impl WinProbability {
    /// Create a reduced fraction. `total` must be non-zero.
    pub fn new(wins: u64, total: u64) -> Self {
        debug_assert!(total > 0, "probability denominator must be non-zero");
        let divisor = gcd(wins, total).max(1);
        Self {
            wins: wins / divisor,
            total: total / divisor,
        }
    }

    /// Reduced numerator.
    pub fn numerator(&self) -> u64 {
        self.wins
    }

    /// Reduced denominator.
    pub fn denominator(&self) -> u64 {
        self.total
    }

    /// Floating-point value for display.
    pub fn as_f64(&self) -> f64 {
        self.wins as f64 / self.total as f64
    }
}

impl fmt::Display for WinProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Probability that a throw of `a` strictly beats a throw of `b`.
pub fn win_probability(a: &Die, b: &Die) -> WinProbability {
    let wins = a
        .faces()
        .iter()
        .map(|&fa| b.faces().iter().filter(|&&fb| fa > fb).count() as u64)
        .sum();
    let total = (a.face_count() * b.face_count()) as u64;

    WinProbability::new(wins, total)
}

/// Square table of pairwise win probabilities.
///
/// Cell `(i, j)` is the chance die `i` beats die `j`. The diagonal is
/// `None`: a die against itself is not a matchup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbabilityMatrix {
    cells: Vec<Vec<Option<WinProbability>>>,
}

impl ProbabilityMatrix {
    /// Number of dice on each axis.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Cell `(row, col)`; `None` on the diagonal or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<WinProbability> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

/// Compute every off-diagonal matchup. Recompute whenever the dice change.
pub fn compute_matrix(dice: &[Die]) -> ProbabilityMatrix {
    let cells = dice
        .iter()
        .enumerate()
        .map(|(i, a)| {
            dice.iter()
                .enumerate()
                .map(|(j, b)| (i != j).then(|| win_probability(a, b)))
                .collect()
        })
        .collect();

    ProbabilityMatrix { cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn die(faces: &[i64]) -> Die {
        Die::new(faces.to_vec()).unwrap()
    }

    fn canonical_set() -> Vec<Die> {
        vec![
            die(&[2, 2, 4, 4, 9, 9]),
            die(&[1, 1, 6, 6, 8, 8]),
            die(&[3, 3, 5, 5, 7, 7]),
        ]
    }

    #[test]
    fn test_non_transitive_cycle() {
        let matrix = compute_matrix(&canonical_set());
        let five_ninths = WinProbability::new(5, 9);
        let four_ninths = WinProbability::new(4, 9);

        // A beats B, B beats C, C beats A
        assert_eq!(matrix.get(0, 1), Some(five_ninths));
        assert_eq!(matrix.get(1, 2), Some(five_ninths));
        assert_eq!(matrix.get(2, 0), Some(five_ninths));

        assert_eq!(matrix.get(1, 0), Some(four_ninths));
        assert_eq!(matrix.get(2, 1), Some(four_ninths));
        assert_eq!(matrix.get(0, 2), Some(four_ninths));
    }

    #[test]
    fn test_each_die_beats_exactly_one() {
        let matrix = compute_matrix(&canonical_set());
        for i in 0..matrix.size() {
            let beats = (0..matrix.size())
                .filter(|&j| matrix.get(i, j).map_or(false, |p| p.as_f64() > 0.5))
                .count();
            assert_eq!(beats, 1, "die {} should beat exactly one other", i);
        }
    }

    #[test]
    fn test_diagonal_is_empty() {
        let matrix = compute_matrix(&canonical_set());
        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), None);
        }
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn test_ties_count_for_neither_side() {
        let a = die(&[1, 2, 3]);
        let b = die(&[1, 2, 3]);
        assert_eq!(win_probability(&a, &b), WinProbability::new(3, 9));
        assert_eq!(win_probability(&b, &a), WinProbability::new(1, 3));

        let flat = die(&[4, 4]);
        assert_eq!(win_probability(&flat, &flat).numerator(), 0);
    }

    #[test]
    fn test_different_face_counts() {
        let a = die(&[10]);
        let b = die(&[1, 20]);
        assert_eq!(win_probability(&a, &b), WinProbability::new(1, 2));
    }

    #[test]
    fn test_fraction_reduced_and_display() {
        let p = WinProbability::new(20, 36);
        assert_eq!((p.numerator(), p.denominator()), (5, 9));
        assert_eq!(p.to_string(), "0.5556");
        assert_eq!(WinProbability::new(0, 36).denominator(), 1);
    }

    proptest! {
        #[test]
        fn prop_opposing_odds_never_exceed_one(
            a in prop::collection::vec(-20i64..20, 1..8),
            b in prop::collection::vec(-20i64..20, 1..8),
        ) {
            let (a, b) = (die(&a), die(&b));
            let ab = win_probability(&a, &b);
            let ba = win_probability(&b, &a);

            let ties = a.faces().iter()
                .map(|x| b.faces().iter().filter(|y| x == *y).count())
                .sum::<usize>() as f64
                / (a.face_count() * b.face_count()) as f64;

            prop_assert!(ab.as_f64() + ba.as_f64() <= 1.0 + 1e-12);
            prop_assert!((ab.as_f64() + ba.as_f64() + ties - 1.0).abs() < 1e-9);
        }
    }
}
