//! Upload and detection orchestration.
//!
//! The orchestrator owns the [`SessionState`] and drives one upload cycle as a sequence of
//! explicit steps: [`select_file`](Orchestrator::select_file) hands out a [`DecodeJob`],
//! [`image_decoded`](Orchestrator::image_decoded) turns its outcome into a [`DetectJob`], and
//! [`detection_finished`](Orchestrator::detection_finished) scores the first face and draws the
//! overlay. Jobs may run on any thread; every outcome carries the generation it was started for
//! and outcomes of superseded generations are dropped without touching the state.

use std::sync::Arc;

use image::DynamicImage;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    error::{DetectionError, DetectionFailure, InitError, UploadError},
    landmarks::DetectedFace,
    overlay::{OverlayCanvas, OverlayStyle},
    provider::{DetectorOptions, LandmarkProvider, ReadyModels},
    session::{CancellationToken, Generation, SelectedFile, SessionState},
    symmetry::{self, SymmetryScore},
};
use facesym_utils::{decode_image_bytes, timing_guard};

/// Why a selection did not start a new cycle.
#[derive(Debug, Error)]
pub enum UploadRejected {
    #[error("face detection models are not loaded")]
    ModelsNotReady,
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Decodes the selected file's bytes.
#[derive(Debug)]
pub struct DecodeJob {
    generation: Generation,
    token: CancellationToken,
    file: SelectedFile,
}

/// Result of a [`DecodeJob`].
#[derive(Debug)]
pub struct DecodeOutcome {
    pub generation: Generation,
    pub result: Result<DynamicImage, DetectionError>,
}

impl DecodeJob {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    pub async fn run(self) -> DecodeOutcome {
        let result = if self.token.is_cancelled() {
            Err(DetectionError::Cancelled)
        } else {
            let _guard = timing_guard("facesym_core::decode_image", log::Level::Debug);
            decode_image_bytes(&self.file.bytes)
                .map_err(|e| DetectionError::InvalidInput(format!("{e:#}")))
        };
        DecodeOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// Runs the landmark provider on a decoded image.
pub struct DetectJob<P> {
    generation: Generation,
    token: CancellationToken,
    image: Arc<DynamicImage>,
    models: ReadyModels<P>,
    options: DetectorOptions,
}

/// Result of a [`DetectJob`].
#[derive(Debug)]
pub struct DetectOutcome {
    pub generation: Generation,
    pub result: Result<Vec<DetectedFace>, DetectionError>,
}

impl<P: LandmarkProvider> DetectJob<P> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub async fn run(self) -> DetectOutcome {
        let result = if self.token.is_cancelled() {
            Err(DetectionError::Cancelled)
        } else {
            let faces = self
                .models
                .provider()
                .detect_faces(&self.image, &self.options)
                .await;
            if self.token.is_cancelled() {
                Err(DetectionError::Cancelled)
            } else {
                faces
            }
        };
        DetectOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// What [`Orchestrator::detection_finished`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Detected(SymmetryScore),
    Failed(DetectionFailure),
    /// The outcome belonged to a superseded generation and was dropped.
    Stale,
}

/// State machine coordinating model readiness, file intake, detection and scoring.
pub struct Orchestrator<P> {
    state: SessionState,
    models: Option<ReadyModels<P>>,
    options: DetectorOptions,
    overlay_style: OverlayStyle,
    generation: Generation,
    token: CancellationToken,
}

impl<P: LandmarkProvider> Orchestrator<P> {
    /// Start in `ModelsLoading`; call [`models_loaded`](Self::models_loaded) once loading ends.
    pub fn new(options: DetectorOptions, overlay_style: OverlayStyle) -> Self {
        Self {
            state: SessionState::ModelsLoading,
            models: None,
            options,
            overlay_style,
            generation: 0,
            token: CancellationToken::new(),
        }
    }

    /// Initialize `provider` and return an orchestrator in the resulting state.
    pub async fn load(provider: P, options: DetectorOptions, overlay_style: OverlayStyle) -> Self {
        let mut orchestrator = Self::new(options, overlay_style);
        let loaded = {
            let _guard = timing_guard("facesym_core::initialize_models", log::Level::Info);
            ReadyModels::load(provider).await
        };
        orchestrator.models_loaded(loaded);
        orchestrator
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Loaded models, once initialization succeeded.
    pub fn models(&self) -> Option<&ReadyModels<P>> {
        self.models.as_ref()
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Generation of the most recent selection.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Apply the result of model initialization.
    pub fn models_loaded(&mut self, result: Result<ReadyModels<P>, InitError>) {
        if !matches!(self.state, SessionState::ModelsLoading) {
            warn!("ignoring repeated model initialization result");
            return;
        }
        match result {
            Ok(models) => {
                info!("face detection models ready");
                self.models = Some(models);
                self.state = SessionState::Idle;
            }
            Err(err) => {
                error!("model initialization failed: {}", error_chain(&err));
                self.state = SessionState::init_failed();
            }
        }
    }

    /// Start a new upload cycle, superseding whatever is in flight.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> Result<DecodeJob, UploadRejected> {
        self.select_upload(file.ok_or(UploadError::NoFile))
    }

    /// Like [`select_file`](Self::select_file), for callers that read the file themselves.
    /// A failed read still supersedes the current cycle and ends in `UploadFailed`.
    pub fn select_upload(
        &mut self,
        file: Result<SelectedFile, UploadError>,
    ) -> Result<DecodeJob, UploadRejected> {
        if !self.state.can_upload() {
            return Err(UploadRejected::ModelsNotReady);
        }

        self.generation += 1;
        self.token.cancel();
        self.token = CancellationToken::new();
        // Dropping the previous state releases the previously displayed image.
        self.state = SessionState::Idle;

        let validated = file.and_then(|file| file.validate().map(|()| file));
        match validated {
            Ok(file) => {
                debug!(
                    "generation {}: decoding {} ({} bytes)",
                    self.generation,
                    file.name,
                    file.bytes.len()
                );
                self.state = SessionState::Decoding {
                    generation: self.generation,
                    source: file.name.clone(),
                };
                Ok(DecodeJob {
                    generation: self.generation,
                    token: self.token.clone(),
                    file,
                })
            }
            Err(err) => {
                warn!("upload rejected: {}", error_chain(&err));
                self.state = SessionState::upload_failed();
                Err(err.into())
            }
        }
    }

    /// Apply a decode outcome; returns the detection step when decoding succeeded.
    pub fn image_decoded(&mut self, outcome: DecodeOutcome) -> Option<DetectJob<P>> {
        if !self.is_current(outcome.generation, "decode") {
            return None;
        }
        if !matches!(self.state, SessionState::Decoding { .. }) {
            debug!("decode outcome arrived outside of the decoding state");
            return None;
        }

        let image = match outcome.result {
            Ok(image) => Arc::new(image),
            Err(err) => {
                warn!(
                    "generation {}: image decode failed: {}",
                    outcome.generation,
                    error_chain(&err)
                );
                self.fail(None, DetectionFailure::Processing);
                return None;
            }
        };

        let Some(models) = self.models.clone() else {
            error!("decoded an image without loaded models");
            self.fail(Some(image), DetectionFailure::Processing);
            return None;
        };

        self.state = SessionState::Detecting {
            generation: self.generation,
            image: Arc::clone(&image),
        };
        Some(DetectJob {
            generation: self.generation,
            token: self.token.clone(),
            image,
            models,
            options: self.options.clone(),
        })
    }

    /// Apply a detection outcome: score the first face and draw every face's landmarks.
    pub fn detection_finished(&mut self, outcome: DetectOutcome) -> Applied {
        if !self.is_current(outcome.generation, "detection") {
            return Applied::Stale;
        }
        let image = match &self.state {
            SessionState::Detecting { image, .. } => Arc::clone(image),
            _ => {
                debug!("detection outcome arrived outside of the detecting state");
                return Applied::Stale;
            }
        };

        let faces = match outcome.result {
            Ok(faces) if faces.is_empty() => {
                info!("generation {}: no face detected", self.generation);
                return self.fail(Some(image), DetectionFailure::NoFace);
            }
            Ok(faces) => faces,
            Err(err) => {
                let failure = DetectionFailure::from(&err);
                if failure == DetectionFailure::Processing {
                    warn!(
                        "generation {}: detection failed: {}",
                        self.generation,
                        error_chain(&err)
                    );
                }
                return self.fail(Some(image), failure);
            }
        };

        let score = {
            let _guard = timing_guard("facesym_core::symmetry_score", log::Level::Debug);
            symmetry::score(&faces[0].landmarks)
        };

        let mut canvas = OverlayCanvas::for_image(&image, self.overlay_style.clone());
        if let Some(models) = &self.models {
            models.provider().draw_landmarks(&mut canvas, &faces);
        }

        info!(
            "generation {}: {} face(s), symmetry score {}",
            self.generation,
            faces.len(),
            score
        );
        self.state = SessionState::Detected {
            generation: self.generation,
            image,
            faces,
            score,
            canvas,
        };
        Applied::Detected(score)
    }

    /// Run one complete cycle for `file` and return the resulting state.
    pub async fn process(&mut self, file: Option<SelectedFile>) -> &SessionState {
        self.process_upload(file.ok_or(UploadError::NoFile)).await
    }

    /// Like [`process`](Self::process), keeping the caller's read error for the log.
    pub async fn process_upload(
        &mut self,
        file: Result<SelectedFile, UploadError>,
    ) -> &SessionState {
        let job = match self.select_upload(file) {
            Ok(job) => job,
            Err(rejected) => {
                debug!("selection did not start a cycle: {rejected}");
                return &self.state;
            }
        };
        let decoded = job.run().await;
        if let Some(detect) = self.image_decoded(decoded) {
            let outcome = detect.run().await;
            self.detection_finished(outcome);
        }
        &self.state
    }

    fn is_current(&self, generation: Generation, step: &str) -> bool {
        if generation == self.generation {
            return true;
        }
        debug!(
            "discarding stale {step} outcome for generation {generation} (current {})",
            self.generation
        );
        false
    }

    fn fail(&mut self, image: Option<Arc<DynamicImage>>, failure: DetectionFailure) -> Applied {
        self.state = SessionState::DetectionFailed {
            generation: self.generation,
            image,
            failure,
        };
        Applied::Failed(failure)
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(err)
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
