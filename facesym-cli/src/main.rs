mod annotate;
mod args;
mod config;
mod types;

use std::{
    fs::{self, File},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use facesym_core::{
    DetectorOptions, ModelArtifacts, OnnxLandmarkProvider, Orchestrator, OverlayStyle,
    SelectedFile, SessionState,
};
use log::{info, warn};

use crate::{
    annotate::save_overlay,
    args::AnalyzeArgs,
    config::{apply_cli_overrides, load_settings},
    types::AnalysisRecord,
};
use facesym_utils::init_logging;

fn main() -> Result<ExitCode> {
    init_logging(log::LevelFilter::Info)?;
    let args = AnalyzeArgs::parse();

    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    settings.telemetry.apply();

    let artifacts = ModelArtifacts::from(settings.models.clone());
    let options = DetectorOptions::from(settings.detector.clone());
    let style = OverlayStyle::from(&settings.overlay);
    info!(
        "Loading face detection models from {} ({} detector)",
        artifacts.base_dir.display(),
        options.variant
    );

    let provider = OnnxLandmarkProvider::new(artifacts, settings.landmarks.clone());
    let mut orchestrator = pollster::block_on(Orchestrator::load(provider, options, style));
    if let SessionState::InitFailed { message } = orchestrator.state() {
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    }

    let upload = SelectedFile::from_path(&args.input);
    let state = pollster::block_on(orchestrator.process_upload(upload));

    let mut record = AnalysisRecord::from_state(args.input.display().to_string(), state);
    if let Some(path) = args.annotate.as_ref() {
        match save_overlay(state, path) {
            Ok(Some(written)) => {
                info!("Annotated image saved to {}", written.display());
                record.annotated = Some(written.display().to_string());
            }
            Ok(None) => info!("No face scored; skipping annotated output"),
            Err(err) => warn!("Failed to annotate {}: {err:#}", args.input.display()),
        }
    }

    match record.score {
        Some(score) => info!("{} -> symmetry score {score}%", record.image),
        None => info!("{} -> {}", record.image, record.state),
    }

    if let Some(json_path) = args.json.as_ref() {
        if let Some(dir) = json_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &record)
            .with_context(|| format!("failed to write report JSON to {}", json_path.display()))?;
        info!("Wrote report to {}", json_path.display());
    } else {
        let json = serde_json::to_string_pretty(&record).context("failed to serialize report")?;
        println!("{json}");
    }

    Ok(ExitCode::SUCCESS)
}
