//! Application state and worker messages for the facesym GUI.

use std::sync::mpsc;

use egui::TextureHandle;
use facesym_core::{
    DecodeOutcome, DetectOutcome, Generation, InitError, OnnxLandmarkProvider, Orchestrator,
    ReadyModels,
};
use facesym_utils::config::AppSettings;

/// Top-level application state.
pub struct FaceSymApp<P = OnnxLandmarkProvider> {
    /// Loaded settings.
    pub settings: AppSettings,
    /// Upload and detection state machine.
    pub orchestrator: Orchestrator<P>,
    /// Sender handed to background jobs.
    pub job_tx: mpsc::Sender<JobMessage<P>>,
    /// Receiver drained once per frame.
    pub job_rx: mpsc::Receiver<JobMessage<P>>,
    /// GPU textures mirroring the orchestrator's display state.
    pub preview: PreviewState,
    /// Jobs handed to the worker pool whose result has not been applied yet.
    pub jobs_in_flight: usize,
}

/// Result of background work, applied on the UI thread.
pub enum JobMessage<P> {
    ModelsLoaded(Result<ReadyModels<P>, InitError>),
    Decoded(DecodeOutcome),
    Detected(DetectOutcome),
}

/// Textures for the uploaded image and its landmark overlay.
#[derive(Default)]
pub struct PreviewState {
    /// Generation the textures were built for.
    pub generation: Option<Generation>,
    pub image: Option<TextureHandle>,
    pub overlay: Option<TextureHandle>,
    /// Source image dimensions in pixels.
    pub image_size: Option<(u32, u32)>,
}

impl PreviewState {
    /// Drop both textures.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
