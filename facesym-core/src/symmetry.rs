//! Bilateral symmetry score computed from a 68-point landmark set.
//!
//! The metric sums the Manhattan distance between fixed left/right landmark pairs in raw pixel
//! units and subtracts it from 100. Nothing is normalized for pose, rotation or face size, so
//! the same face photographed at a higher resolution scores lower, and a mirror-symmetric face
//! only reaches 100 when each pair's points coincide.

use std::fmt;

use serde::Serialize;

use crate::{
    error::ScoreError,
    landmarks::{FaceLandmarks, LandmarkPoint},
};

/// Left/right landmark pairs compared by the scorer.
///
/// `(40, 40)` compares a point with itself and always contributes zero, so at most twelve
/// pairs influence the result.
pub const SYMMETRY_PAIRS: [(usize, usize); 13] = [
    (0, 16),
    (1, 15),
    (2, 14),
    (3, 13),
    (4, 12),
    (5, 11),
    (6, 10),
    (7, 9),
    (37, 43),
    (38, 42),
    (39, 41),
    (40, 40),
    (31, 35),
];

/// Fixed divisor applied to the summed difference before it is expressed as a percentage.
pub const NORMALIZATION_DIVISOR: f64 = 100.0;

/// Integer symmetry score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SymmetryScore(u8);

impl SymmetryScore {
    pub const MAX: SymmetryScore = SymmetryScore(100);

    pub fn value(self) -> u8 {
        self.0
    }

    fn from_total_difference(total: f64) -> Self {
        let raw = 100.0 - (total / NORMALIZATION_DIVISOR) * 100.0;
        // Differences are non-negative, so only the floor needs clamping.
        SymmetryScore(raw.max(0.0).round() as u8)
    }
}

impl fmt::Display for SymmetryScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Manhattan distance between the two points of `pair`.
pub fn pair_difference(landmarks: &FaceLandmarks, pair: (usize, usize)) -> f64 {
    manhattan(landmarks.points(), pair)
}

/// Sum of all pair differences.
pub fn total_difference(landmarks: &FaceLandmarks) -> f64 {
    sum_pairs(landmarks.points())
}

/// Score a validated landmark set.
pub fn score(landmarks: &FaceLandmarks) -> SymmetryScore {
    SymmetryScore::from_total_difference(total_difference(landmarks))
}

/// Score raw points, rejecting sets that do not follow the 68-point convention.
pub fn score_points(points: &[LandmarkPoint]) -> Result<SymmetryScore, ScoreError> {
    let landmarks = FaceLandmarks::new(points.to_vec())?;
    Ok(score(&landmarks))
}

fn manhattan(points: &[LandmarkPoint], (left, right): (usize, usize)) -> f64 {
    let a = points[left];
    let b = points[right];
    (f64::from(a.x) - f64::from(b.x)).abs() + (f64::from(a.y) - f64::from(b.y)).abs()
}

fn sum_pairs(points: &[LandmarkPoint]) -> f64 {
    SYMMETRY_PAIRS
        .iter()
        .map(|&pair| manhattan(points, pair))
        .sum()
}

/// Per-pair breakdown of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairDifference {
    pub left: usize,
    pub right: usize,
    pub difference: f64,
}

/// Score plus the differences it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryReport {
    pub score: SymmetryScore,
    pub total_difference: f64,
    pub pairs: Vec<PairDifference>,
}

impl SymmetryReport {
    pub fn from_landmarks(landmarks: &FaceLandmarks) -> Self {
        let pairs: Vec<PairDifference> = SYMMETRY_PAIRS
            .iter()
            .map(|&(left, right)| PairDifference {
                left,
                right,
                difference: pair_difference(landmarks, (left, right)),
            })
            .collect();
        let total_difference = pairs.iter().map(|pair| pair.difference).sum();
        Self {
            score: SymmetryScore::from_total_difference(total_difference),
            total_difference,
            pairs,
        }
    }
}
