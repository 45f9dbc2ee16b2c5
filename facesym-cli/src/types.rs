//! Shared types and conversions for facesym-cli.

use facesym_core::{DetectedFace, PairDifference, SessionState, SymmetryReport};
use serde::Serialize;

/// A serializable representation of a single detected face.
#[derive(Debug, Serialize)]
pub struct FaceRecord {
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub landmarks: Vec<[f32; 2]>,
}

/// Outcome of analyzing one image.
#[derive(Debug, Serialize)]
pub struct AnalysisRecord {
    pub image: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub faces: Vec<FaceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_difference: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<PairDifference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<String>,
}

impl From<&DetectedFace> for FaceRecord {
    fn from(face: &DetectedFace) -> Self {
        Self {
            confidence: face.confidence,
            bbox: [face.bbox.x, face.bbox.y, face.bbox.width, face.bbox.height],
            landmarks: face
                .landmarks
                .points()
                .iter()
                .map(|point| [point.x, point.y])
                .collect(),
        }
    }
}

impl AnalysisRecord {
    /// Summarize a settled session state for `image`.
    pub fn from_state(image: impl Into<String>, state: &SessionState) -> Self {
        let faces = state.faces();
        let report = faces
            .first()
            .map(|face| SymmetryReport::from_landmarks(&face.landmarks));
        Self {
            image: image.into(),
            state: state.label(),
            score: state.score().map(|score| score.value()),
            error: state.error_message(),
            faces: faces.iter().map(FaceRecord::from).collect(),
            total_difference: report.as_ref().map(|r| r.total_difference),
            pairs: report.map(|r| r.pairs),
            annotated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facesym_core::{
        BoundingBox, DetectionFailure, FaceLandmarks, LandmarkPoint, NO_FACE_MESSAGE,
        OverlayCanvas, OverlayStyle, symmetry,
    };
    use image::DynamicImage;
    use std::sync::Arc;

    fn face() -> DetectedFace {
        let points = (0..68)
            .map(|i| LandmarkPoint::new(i as f32, 10.0))
            .collect::<Vec<_>>();
        DetectedFace {
            bbox: BoundingBox {
                x: 1.0,
                y: 2.0,
                width: 30.0,
                height: 40.0,
            },
            confidence: 0.9,
            landmarks: FaceLandmarks::new(points).expect("68 points"),
        }
    }

    #[test]
    fn detected_state_carries_score_and_pairs() {
        let face = face();
        let score = symmetry::score(&face.landmarks);
        let image = Arc::new(DynamicImage::new_rgba8(8, 8));
        let state = SessionState::Detected {
            generation: 1,
            canvas: OverlayCanvas::for_image(&image, OverlayStyle::default()),
            image,
            faces: vec![face],
            score,
        };

        let record = AnalysisRecord::from_state("face.png", &state);
        assert_eq!(record.state, "detected");
        assert_eq!(record.score, Some(score.value()));
        assert_eq!(record.error, None);
        assert_eq!(record.faces.len(), 1);
        assert_eq!(record.faces[0].bbox, [1.0, 2.0, 30.0, 40.0]);
        assert_eq!(record.faces[0].landmarks.len(), 68);
        assert_eq!(record.pairs.as_ref().map(Vec::len), Some(13));
    }

    #[test]
    fn failed_state_omits_score_fields_in_json() {
        let state = SessionState::DetectionFailed {
            generation: 1,
            image: None,
            failure: DetectionFailure::NoFace,
        };
        let record = AnalysisRecord::from_state("blank.png", &state);
        let json = serde_json::to_value(&record).expect("serialize");

        assert_eq!(json["state"], "no_face");
        assert_eq!(json["error"], NO_FACE_MESSAGE);
        assert!(json.get("score").is_none());
        assert!(json.get("pairs").is_none());
        assert_eq!(json["faces"].as_array().map(Vec::len), Some(0));
    }
}
