//! Face geometry produced by a landmark provider.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;

/// Number of points in the 68-point facial landmark convention.
pub const LANDMARK_COUNT: usize = 68;

/// Landmark coordinate (x, y) in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Anatomical groups of the 68-point scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacialRegion {
    Jaw,
    LeftEyebrow,
    RightEyebrow,
    Nose,
    LeftEye,
    RightEye,
    Mouth,
}

impl FacialRegion {
    pub const ALL: [FacialRegion; 7] = [
        FacialRegion::Jaw,
        FacialRegion::LeftEyebrow,
        FacialRegion::RightEyebrow,
        FacialRegion::Nose,
        FacialRegion::LeftEye,
        FacialRegion::RightEye,
        FacialRegion::Mouth,
    ];

    /// Landmark indices belonging to the region.
    pub fn indices(self) -> RangeInclusive<usize> {
        match self {
            FacialRegion::Jaw => 0..=16,
            FacialRegion::LeftEyebrow => 17..=21,
            FacialRegion::RightEyebrow => 22..=26,
            FacialRegion::Nose => 27..=35,
            FacialRegion::LeftEye => 36..=41,
            FacialRegion::RightEye => 42..=47,
            FacialRegion::Mouth => 48..=67,
        }
    }
}

/// Exactly 68 finite landmark points, indexed by anatomical meaning.
///
/// Construction validates the count and coordinates, so consumers such as the symmetry scorer
/// can index freely.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self, LandmarkError> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(Self { points })
    }

    /// Build from `[x, y]` pairs, the layout used by JSON fixtures and reports.
    pub fn from_pairs(pairs: &[[f32; 2]]) -> Result<Self, LandmarkError> {
        Self::new(
            pairs
                .iter()
                .map(|&[x, y]| LandmarkPoint::new(x, y))
                .collect(),
        )
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Point at `index`, or `None` past the end of the scheme.
    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    pub fn region(&self, region: FacialRegion) -> &[LandmarkPoint] {
        &self.points[region.indices()]
    }
}

/// Axis-aligned bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The x-coordinate of the top-left corner.
    pub x: f32,
    /// The y-coordinate of the top-left corner.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Intersection over Union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if intersection <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// One detected face: detector metadata plus its landmark set.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub landmarks: FaceLandmarks,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<LandmarkPoint> {
        (0..count)
            .map(|i| LandmarkPoint::new(i as f32, (i * 2) as f32))
            .collect()
    }

    #[test]
    fn rejects_wrong_point_count() {
        let err = FaceLandmarks::new(grid(67)).expect_err("67 points");
        assert_eq!(
            err,
            LandmarkError::WrongCount {
                expected: 68,
                actual: 67
            }
        );
        assert!(FaceLandmarks::new(Vec::new()).is_err());
        assert!(FaceLandmarks::new(grid(69)).is_err());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut points = grid(68);
        points[40].y = f32::NAN;
        assert_eq!(
            FaceLandmarks::new(points).expect_err("NaN"),
            LandmarkError::NonFinite { index: 40 }
        );
    }

    #[test]
    fn regions_cover_every_index_once() {
        let landmarks = FaceLandmarks::new(grid(68)).expect("valid");
        let total: usize = FacialRegion::ALL
            .iter()
            .map(|region| landmarks.region(*region).len())
            .sum();
        assert_eq!(total, LANDMARK_COUNT);
        assert_eq!(landmarks.region(FacialRegion::Mouth)[0].x, 48.0);
        assert_eq!(landmarks.point(16), Some(LandmarkPoint::new(16.0, 32.0)));
        assert_eq!(landmarks.point(68), None);
    }

    #[test]
    fn iou_of_overlapping_boxes() {
        let a = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = BoundingBox { x: 5.0, ..a };
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&BoundingBox { x: 20.0, ..a }), 0.0);
        assert_eq!(a.center(), (5.0, 5.0));
    }
}
