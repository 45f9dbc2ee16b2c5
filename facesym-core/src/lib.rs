//! Facial landmark symmetry scoring and detection orchestration.
//!
//! This crate defines the 68-point landmark model, the symmetry scorer, the landmark provider
//! seam with an ONNX implementation running on `tract-onnx`, the overlay renderer, and the
//! orchestrator that sequences upload, decode, detection and scoring.

/// Face detection runner (YuNet).
pub mod detector;
/// Typed errors and their user-facing messages.
pub mod error;
/// 68-point landmark regression.
pub mod landmark_net;
/// Landmark points, face regions, boxes.
pub mod landmarks;
/// ONNX model loading and execution.
pub mod model;
/// Concrete landmark provider over ONNX graphs.
pub mod onnx_provider;
/// Upload/detection state machine.
pub mod orchestrator;
/// Landmark overlay drawing.
pub mod overlay;
/// Detection post-processing (NMS, score filtering).
pub mod postprocess;
/// Image pre-processing (resizing, cropping, tensor conversion).
pub mod preprocess;
/// Landmark provider interface and the initialize-once model handle.
pub mod provider;
/// Session state and file intake.
pub mod session;
/// Bilateral symmetry score.
pub mod symmetry;

pub use error::{
    DetectionError, DetectionFailure, INIT_ERROR_MESSAGE, InitError, LandmarkError,
    NO_FACE_MESSAGE, PROCESSING_ERROR_MESSAGE, ScoreError, UPLOAD_ERROR_MESSAGE, UploadError,
};
pub use landmarks::{
    BoundingBox, DetectedFace, FaceLandmarks, FacialRegion, LANDMARK_COUNT, LandmarkPoint,
};
pub use onnx_provider::OnnxLandmarkProvider;
pub use orchestrator::{
    Applied, DecodeJob, DecodeOutcome, DetectJob, DetectOutcome, Orchestrator, UploadRejected,
};
pub use overlay::{OverlayCanvas, OverlayStyle};
pub use provider::{
    ArtifactPaths, DetectorOptions, DetectorVariant, LandmarkProvider, ModelArtifacts,
    ReadyModels,
};
pub use session::{CancellationToken, Generation, SelectedFile, SessionState};
pub use symmetry::{
    NORMALIZATION_DIVISOR, PairDifference, SYMMETRY_PAIRS, SymmetryReport, SymmetryScore, score,
    score_points,
};

/// Title shown by the front ends.
pub const APP_TITLE: &str = "Face Symmetry Analyzer";
/// Status line shown while models load.
pub const LOADING_MESSAGE: &str = "Loading face detection models...";
