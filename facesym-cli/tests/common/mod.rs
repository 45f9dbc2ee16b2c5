//! Common test utilities for CLI integration tests
#![allow(dead_code)]

use std::{error::Error, fs, path::Path, path::PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;

const MODEL_FILES: [&str; 3] = [
    "face_detection_yunet_2023mar.onnx",
    "face_landmark_68.onnx",
    "face_recognition_sface_2021dec.onnx",
];

/// Directory holding all three models, when they are checked out.
pub fn find_models_dir() -> Option<PathBuf> {
    ["models", "../models"]
        .into_iter()
        .map(PathBuf::from)
        .find(|dir| MODEL_FILES.iter().all(|name| dir.join(name).exists()))
}

pub fn fixture_image() -> PathBuf {
    facesym_utils::fixture_path("images/blank_64.png").expect("blank fixture")
}

/// Subset of the CLI report the tests inspect.
#[derive(Debug, Deserialize)]
pub struct CliReport {
    pub image: String,
    pub state: String,
    pub score: Option<u8>,
    pub error: Option<String>,
    pub faces: Vec<serde_json::Value>,
    pub annotated: Option<String>,
}

/// Run the CLI writing its report to `json_path`, asserting success.
pub fn run_cli_report(
    input: &Path,
    models: &Path,
    json_path: &Path,
    extra_args: &[&str],
) -> Result<CliReport, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("facesym-cli");
    cmd.arg("--input")
        .arg(input)
        .arg("--models")
        .arg(models)
        .arg("--json")
        .arg(json_path)
        .args(extra_args);

    cmd.assert().success();
    let payload = fs::read_to_string(json_path)?;
    Ok(serde_json::from_str(&payload)?)
}

/// Skip the calling test when the ONNX models are not available.
#[macro_export]
macro_rules! require_models {
    () => {{
        match $crate::common::find_models_dir() {
            Some(dir) => dir,
            None => {
                eprintln!("Skipping test: models not found");
                return Ok(());
            }
        }
    }};
}
