//! Landmark provider seam and the initialize-once model handle.
//!
//! A [`LandmarkProvider`] turns an image into zero or more [`DetectedFace`]s. Providers start
//! uninitialized; the only way to hand one to the orchestrator is [`ReadyModels::load`], which
//! awaits initialization and then freezes the provider behind a shared read-only handle.

use std::{fmt, future::Future, path::PathBuf, sync::Arc};

use image::DynamicImage;

use crate::{
    error::{DetectionError, InitError},
    landmarks::DetectedFace,
    overlay::OverlayCanvas,
};
use facesym_utils::config::{DetectorSettings, InputDimensions, ModelSettings};

pub use facesym_utils::config::DetectorVariant;

/// Names and location of the three model artifacts a provider loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    pub base_dir: PathBuf,
    pub detector: String,
    pub landmarks: String,
    pub recognition: String,
}

/// Artifact file names resolved against the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub detector: PathBuf,
    pub landmarks: PathBuf,
    pub recognition: PathBuf,
}

impl ModelArtifacts {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            detector: self.base_dir.join(&self.detector),
            landmarks: self.base_dir.join(&self.landmarks),
            recognition: self.base_dir.join(&self.recognition),
        }
    }

    /// Same artifact names under a different base directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }
}

impl Default for ModelArtifacts {
    fn default() -> Self {
        ModelSettings::default().into()
    }
}

impl From<ModelSettings> for ModelArtifacts {
    fn from(settings: ModelSettings) -> Self {
        Self {
            base_dir: PathBuf::from(settings.base_dir),
            detector: settings.detector,
            landmarks: settings.landmarks,
            recognition: settings.recognition,
        }
    }
}

impl From<&ModelSettings> for ModelArtifacts {
    fn from(settings: &ModelSettings) -> Self {
        settings.clone().into()
    }
}

/// Per-call detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    pub variant: DetectorVariant,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl DetectorOptions {
    /// Fast, low-resolution variant used for interactive analysis.
    pub fn tiny() -> Self {
        Self {
            variant: DetectorVariant::Tiny,
            ..DetectorSettings::default().into()
        }
    }

    /// Full-resolution variant.
    pub fn full() -> Self {
        Self {
            variant: DetectorVariant::Full,
            ..Self::tiny()
        }
    }

    pub fn input_dimensions(&self) -> InputDimensions {
        self.variant.input_dimensions()
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self::tiny()
    }
}

impl From<DetectorSettings> for DetectorOptions {
    fn from(settings: DetectorSettings) -> Self {
        Self {
            variant: settings.variant,
            score_threshold: settings.score_threshold,
            nms_threshold: settings.nms_threshold,
            top_k: settings.top_k,
        }
    }
}

impl From<&DetectorSettings> for DetectorOptions {
    fn from(settings: &DetectorSettings) -> Self {
        settings.clone().into()
    }
}

/// Source of faces and their 68-point landmarks.
pub trait LandmarkProvider: Send + Sync {
    /// Load every model artifact. Must complete before [`detect_faces`](Self::detect_faces).
    fn initialize(&mut self) -> impl Future<Output = Result<(), InitError>> + Send;

    /// Detect faces in `image`. An empty list is a valid answer.
    fn detect_faces(
        &self,
        image: &DynamicImage,
        options: &DetectorOptions,
    ) -> impl Future<Output = Result<Vec<DetectedFace>, DetectionError>> + Send;

    /// Render the landmarks of `faces` onto `canvas`.
    fn draw_landmarks(&self, canvas: &mut OverlayCanvas, faces: &[DetectedFace]) {
        canvas.draw_faces(faces);
    }
}

/// Initialized provider shared read-only between the orchestrator and its jobs.
pub struct ReadyModels<P> {
    provider: Arc<P>,
}

impl<P: LandmarkProvider> ReadyModels<P> {
    /// Initialize `provider` and wrap it once loading succeeded.
    pub async fn load(mut provider: P) -> Result<Self, InitError> {
        provider.initialize().await?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P> Clone for ReadyModels<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> fmt::Debug for ReadyModels<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyModels")
            .field("handles", &Arc::strong_count(&self.provider))
            .finish()
    }
}
