//! Command-line argument definitions for facesym-cli.

use clap::{ArgAction, Parser};
use facesym_utils::config::DetectorVariant;
use std::path::PathBuf;

/// Score the bilateral symmetry of the first face found in an image.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct AnalyzeArgs {
    /// Path to the image file to analyze.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory holding the detector, landmark and recognition models.
    #[arg(short, long, value_name = "DIR")]
    pub models: Option<PathBuf>,

    /// Optional settings JSON. Defaults to `config/facesym_settings.json` when present, otherwise built-in parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Detector variant: `tiny` (fast, default) or `full` (accurate).
    #[arg(long, value_name = "VARIANT")]
    pub detector: Option<DetectorVariant>,

    /// Override score threshold.
    #[arg(long)]
    pub score_threshold: Option<f32>,

    /// Draw face boxes in addition to landmark points on the annotated image.
    #[arg(long, action = ArgAction::SetTrue)]
    pub draw_boxes: bool,

    /// Write the image with the landmark overlay to this PNG path.
    #[arg(long, value_name = "PNG")]
    pub annotate: Option<PathBuf>,

    /// Write the report to a JSON file instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}
