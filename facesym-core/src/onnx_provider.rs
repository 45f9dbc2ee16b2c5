//! Landmark provider backed by ONNX graphs executed with `tract-onnx`.

use image::{DynamicImage, GenericImageView};
use log::{debug, info};

use crate::{
    detector::FaceDetector,
    error::{DetectionError, InitError},
    landmark_net::LandmarkRegressor,
    landmarks::{DetectedFace, FaceLandmarks},
    model::OnnxModel,
    provider::{DetectorOptions, LandmarkProvider, ModelArtifacts},
};
use facesym_utils::{config::LandmarkNetSettings, timing_guard};

struct LoadedNets {
    detector: FaceDetector,
    landmarks: LandmarkRegressor,
    // Loaded so a broken artifact fails initialization; never executed.
    _recognition: OnnxModel,
}

/// Detector + landmark regressor + recognition net loaded from a models directory.
pub struct OnnxLandmarkProvider {
    artifacts: ModelArtifacts,
    landmark_settings: LandmarkNetSettings,
    nets: Option<LoadedNets>,
}

impl OnnxLandmarkProvider {
    pub fn new(artifacts: ModelArtifacts, landmark_settings: LandmarkNetSettings) -> Self {
        Self {
            artifacts,
            landmark_settings,
            nets: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.nets.is_some()
    }

    fn load_nets(&self) -> Result<LoadedNets, InitError> {
        let _guard = timing_guard("facesym_core::load_models", log::Level::Info);
        let paths = self.artifacts.paths();
        for (artifact, path) in [
            ("detector", &paths.detector),
            ("landmark", &paths.landmarks),
            ("recognition", &paths.recognition),
        ] {
            if !path.exists() {
                return Err(InitError::MissingArtifact {
                    artifact,
                    path: path.clone(),
                });
            }
        }

        let detector = FaceDetector::new(&paths.detector).map_err(|e| InitError::Load {
            artifact: "detector",
            path: paths.detector.clone(),
            source: e.into(),
        })?;
        let landmarks = LandmarkRegressor::new(&paths.landmarks, &self.landmark_settings)
            .map_err(|e| InitError::Load {
                artifact: "landmark",
                path: paths.landmarks.clone(),
                source: e.into(),
            })?;
        let recognition =
            OnnxModel::load(&paths.recognition, "recognition").map_err(|e| InitError::Load {
                artifact: "recognition",
                path: paths.recognition.clone(),
                source: e.into(),
            })?;

        info!(
            "loaded face models from {}",
            self.artifacts.base_dir.display()
        );
        Ok(LoadedNets {
            detector,
            landmarks,
            _recognition: recognition,
        })
    }
}

impl LandmarkProvider for OnnxLandmarkProvider {
    async fn initialize(&mut self) -> Result<(), InitError> {
        if self.nets.is_none() {
            self.nets = Some(self.load_nets()?);
        }
        Ok(())
    }

    async fn detect_faces(
        &self,
        image: &DynamicImage,
        options: &DetectorOptions,
    ) -> Result<Vec<DetectedFace>, DetectionError> {
        let nets = self.nets.as_ref().ok_or(DetectionError::NotInitialized)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidInput(format!(
                "image has zero extent ({width}x{height})"
            )));
        }

        let candidates = nets
            .detector
            .detect(image, options)
            .map_err(DetectionError::Inference)?;
        debug!("detector returned {} face candidate(s)", candidates.len());

        let mut faces = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let points = nets
                .landmarks
                .regress(image, &candidate.bbox)
                .map_err(DetectionError::Inference)?;
            faces.push(DetectedFace {
                bbox: candidate.bbox,
                confidence: candidate.score,
                landmarks: FaceLandmarks::new(points)?,
            });
        }
        Ok(faces)
    }
}
