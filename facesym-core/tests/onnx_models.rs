use std::path::PathBuf;

use facesym_core::{
    DetectionFailure, DetectorOptions, ModelArtifacts, OnnxLandmarkProvider, Orchestrator,
    OverlayStyle, SelectedFile, SessionState,
};
use facesym_utils::{config::LandmarkNetSettings, load_fixture_bytes};

fn workspace_models() -> Option<ModelArtifacts> {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../models");
    let artifacts = ModelArtifacts::default().with_base_dir(base);
    let paths = artifacts.paths();
    if [&paths.detector, &paths.landmarks, &paths.recognition]
        .iter()
        .all(|path| path.exists())
    {
        Some(artifacts)
    } else {
        eprintln!(
            "skipping ONNX provider test; models missing under {}",
            artifacts.base_dir.display()
        );
        None
    }
}

#[test]
fn blank_image_reports_no_face() -> anyhow::Result<()> {
    let Some(artifacts) = workspace_models() else {
        return Ok(());
    };

    let provider = OnnxLandmarkProvider::new(artifacts, LandmarkNetSettings::default());
    let mut orchestrator = pollster::block_on(Orchestrator::load(
        provider,
        DetectorOptions::default(),
        OverlayStyle::default(),
    ));
    assert!(orchestrator.state().is_ready());

    let upload = SelectedFile::new("blank.png", load_fixture_bytes("images/blank_64.png")?);
    let state = pollster::block_on(orchestrator.process(Some(upload)));
    assert!(matches!(
        state,
        SessionState::DetectionFailed {
            failure: DetectionFailure::NoFace,
            ..
        }
    ));
    Ok(())
}

#[test]
fn missing_models_fail_initialization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let provider = OnnxLandmarkProvider::new(
        ModelArtifacts::default().with_base_dir(dir.path()),
        LandmarkNetSettings::default(),
    );
    let orchestrator = pollster::block_on(Orchestrator::load(
        provider,
        DetectorOptions::default(),
        OverlayStyle::default(),
    ));
    assert!(matches!(orchestrator.state(), SessionState::InitFailed { .. }));
    assert!(!orchestrator.state().can_upload());
}
