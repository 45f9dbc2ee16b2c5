//! Background jobs: model loading, image decoding and face detection.
//!
//! Every job runs on the rayon pool, drives its future with `pollster`, and posts the outcome
//! back over the app's channel. Outcomes carry their generation; the orchestrator decides on the
//! UI thread whether they still apply.

use std::sync::mpsc;

use facesym_core::{DecodeJob, DetectJob, LandmarkProvider, ReadyModels};
use log::{error, info};

use crate::JobMessage;

/// Initialize `provider` off the UI thread.
pub fn spawn_model_load<P>(provider: P, job_tx: mpsc::Sender<JobMessage<P>>)
where
    P: LandmarkProvider + 'static,
{
    info!("Launching model initialization");
    rayon::spawn(move || {
        let loaded = pollster::block_on(ReadyModels::load(provider));
        if job_tx.send(JobMessage::ModelsLoaded(loaded)).is_err() {
            error!("GUI dropped model initialization result");
        }
    });
}

/// Decode the selected file's bytes.
pub fn spawn_decode<P>(job: DecodeJob, job_tx: mpsc::Sender<JobMessage<P>>)
where
    P: LandmarkProvider + 'static,
{
    let generation = job.generation();
    info!("Launching decode job {generation} for {}", job.file_name());
    rayon::spawn(move || {
        let outcome = pollster::block_on(job.run());
        if job_tx.send(JobMessage::Decoded(outcome)).is_err() {
            error!("GUI dropped decode result for job {generation}");
        }
    });
}

/// Run detection on a decoded image.
pub fn spawn_detection<P>(job: DetectJob<P>, job_tx: mpsc::Sender<JobMessage<P>>)
where
    P: LandmarkProvider + 'static,
{
    let generation = job.generation();
    info!("Launching detection job {generation}");
    rayon::spawn(move || {
        let outcome = pollster::block_on(job.run());
        if job_tx.send(JobMessage::Detected(outcome)).is_err() {
            error!("GUI dropped detection result for job {generation}");
        }
    });
}
