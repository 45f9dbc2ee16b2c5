//! Typed failures raised by the analysis pipeline.
//!
//! Every failure class maps onto exactly one message the user sees. Diagnostic detail stays in
//! the error value and is logged by the orchestrator instead of being displayed.

use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;

/// Shown when the model artifacts cannot be loaded.
pub const INIT_ERROR_MESSAGE: &str =
    "Failed to load face detection models. Please restart the application.";
/// Shown when a selection carries no usable image file.
pub const UPLOAD_ERROR_MESSAGE: &str = "Error uploading image. Please try again.";
/// Shown when detection ran but found no face.
pub const NO_FACE_MESSAGE: &str = "No face detected in the image. Please try another photo.";
/// Shown for any other decode, detection or scoring failure.
pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing image. Please try again.";

/// Failure while loading the model artifacts.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("{artifact} model not found at {path}")]
    MissingArtifact {
        artifact: &'static str,
        path: PathBuf,
    },
    #[error("failed to load {artifact} model from {path}")]
    Load {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("landmark provider initialization failed: {0}")]
    Provider(String),
}

impl InitError {
    pub fn user_message(&self) -> &'static str {
        INIT_ERROR_MESSAGE
    }
}

/// Failure reported by a landmark provider while detecting faces.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("landmark provider used before initialization")]
    NotInitialized,
    #[error("no face detected")]
    NoFace,
    #[error("detection cancelled")]
    Cancelled,
    #[error("invalid input image: {0}")]
    InvalidInput(String),
    #[error("detector produced malformed landmarks: {0}")]
    MalformedLandmarks(#[from] LandmarkError),
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

/// Failure at file-selection time.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file was selected")]
    NoFile,
    #[error("file {name} is empty")]
    Empty { name: String },
    #[error("file {name} has unsupported media type {media_type}")]
    UnsupportedMediaType { name: String, media_type: String },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub fn user_message(&self) -> &'static str {
        UPLOAD_ERROR_MESSAGE
    }
}

/// Landmark set that does not follow the 68-point convention.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmark points, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Scorer rejected its input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("invalid landmark input: {0}")]
    InvalidInput(#[from] LandmarkError),
}

/// User-facing classification of a failed detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionFailure {
    NoFace,
    Processing,
}

impl DetectionFailure {
    pub fn message(self) -> &'static str {
        match self {
            DetectionFailure::NoFace => NO_FACE_MESSAGE,
            DetectionFailure::Processing => PROCESSING_ERROR_MESSAGE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetectionFailure::NoFace => "no_face",
            DetectionFailure::Processing => "processing_failure",
        }
    }
}

impl From<&DetectionError> for DetectionFailure {
    fn from(error: &DetectionError) -> Self {
        match error {
            DetectionError::NoFace => DetectionFailure::NoFace,
            _ => DetectionFailure::Processing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_face_is_actionable() {
        assert_eq!(
            DetectionFailure::from(&DetectionError::NoFace),
            DetectionFailure::NoFace
        );
        assert_eq!(
            DetectionFailure::from(&DetectionError::NotInitialized),
            DetectionFailure::Processing
        );
        assert_eq!(
            DetectionFailure::from(&DetectionError::Inference(anyhow::anyhow!("boom"))),
            DetectionFailure::Processing
        );
        assert_eq!(
            DetectionFailure::Processing.message(),
            "Error processing image. Please try again."
        );
    }

    #[test]
    fn inference_error_displays_context_chain() {
        let err = DetectionError::Inference(
            anyhow::anyhow!("shape mismatch").context("landmark regression failed"),
        );
        let message = err.to_string();
        assert!(message.contains("landmark regression failed"));
        assert!(message.contains("shape mismatch"));
    }

    #[test]
    fn init_and_upload_errors_share_one_message_each() {
        let init = InitError::MissingArtifact {
            artifact: "detector",
            path: PathBuf::from("models/missing.onnx"),
        };
        assert_eq!(init.user_message(), INIT_ERROR_MESSAGE);
        assert!(init.to_string().contains("models/missing.onnx"));

        assert_eq!(UploadError::NoFile.user_message(), UPLOAD_ERROR_MESSAGE);
    }
}
