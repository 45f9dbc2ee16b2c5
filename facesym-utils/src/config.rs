//! Shared configuration types consumed across the facesym workspace.
//!
//! These structures describe where the model artifacts live, how the face detector and the
//! landmark regressor are driven, how the overlay is drawn, and whether timing telemetry is
//! logged. They serialize to a JSON file that both the CLI and the desktop front end read.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Location and file names of the three model artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory the artifact file names are resolved against.
    pub base_dir: String,
    /// Face detector network.
    pub detector: String,
    /// 68-point landmark regression network.
    pub landmarks: String,
    /// Face recognition/embedding network. Loaded and validated, never executed.
    pub recognition: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_dir: "models".into(),
            detector: "face_detection_yunet_2023mar.onnx".into(),
            landmarks: "face_landmark_68.onnx".into(),
            recognition: "face_recognition_sface_2021dec.onnx".into(),
        }
    }
}

/// Resize filter preference for detector preprocessing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeQuality {
    /// Triangle filter.
    #[default]
    Quality,
    /// Nearest filter.
    Speed,
}

impl fmt::Display for ResizeQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResizeQuality::Quality => "quality",
            ResizeQuality::Speed => "speed",
        })
    }
}

/// Inference input resolution in pixels (width x height).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputDimensions {
    pub width: u32,
    pub height: u32,
    pub resize_quality: ResizeQuality,
}

/// Detector variant trading accuracy for latency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorVariant {
    /// Small input, nearest-neighbour resize. Used for interactive analysis.
    #[default]
    Tiny,
    /// Full resolution input with a smoother resize filter.
    Full,
}

impl DetectorVariant {
    /// Input resolution and resize filter associated with the variant.
    pub fn input_dimensions(self) -> InputDimensions {
        match self {
            DetectorVariant::Tiny => InputDimensions {
                width: 320,
                height: 320,
                resize_quality: ResizeQuality::Speed,
            },
            DetectorVariant::Full => InputDimensions {
                width: 640,
                height: 640,
                resize_quality: ResizeQuality::Quality,
            },
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            DetectorVariant::Tiny => "Tiny",
            DetectorVariant::Full => "Full",
        }
    }
}

impl fmt::Display for DetectorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectorVariant::Tiny => "tiny",
            DetectorVariant::Full => "full",
        })
    }
}

impl FromStr for DetectorVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" | "fast" => Ok(DetectorVariant::Tiny),
            "full" | "accurate" => Ok(DetectorVariant::Full),
            other => Err(format!(
                "invalid detector variant '{other}'; expected 'tiny' or 'full'"
            )),
        }
    }
}

/// Face detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    /// Which detector variant to run.
    pub variant: DetectorVariant,
    /// Minimum confidence score for a detection to be considered valid.
    pub score_threshold: f32,
    /// Threshold for non-maximum suppression to merge overlapping bounding boxes.
    pub nms_threshold: f32,
    /// The maximum number of detections to keep before suppression.
    pub top_k: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            variant: DetectorVariant::Tiny,
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 5_000,
        }
    }
}

/// Memory layout of the landmark network input tensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    #[default]
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Landmark regression network parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandmarkNetSettings {
    /// Square input edge length in pixels.
    pub input_size: u32,
    /// Input tensor layout.
    pub layout: TensorLayout,
    /// Multiplier applied to every `0..=255` channel value.
    pub pixel_scale: f32,
    /// Fraction of the face box added on each side before cropping.
    pub crop_margin: f32,
}

impl Default for LandmarkNetSettings {
    fn default() -> Self {
        Self {
            input_size: 112,
            layout: TensorLayout::Nchw,
            pixel_scale: 1.0 / 255.0,
            crop_margin: 0.1,
        }
    }
}

/// Landmark overlay appearance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlaySettings {
    /// RGBA color of landmark dots.
    pub point_color: [u8; 4],
    /// Dot radius in pixels.
    pub point_radius: i32,
    /// Also outline each detection box.
    pub draw_boxes: bool,
    /// RGBA color of detection boxes.
    pub box_color: [u8; 4],
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            point_color: [0, 170, 255, 255],
            point_radius: 2,
            draw_boxes: false,
            box_color: [255, 64, 64, 255],
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }

    /// Push these settings into the global telemetry state.
    pub fn apply(&self) {
        crate::telemetry::configure(self.enabled, self.level_filter());
    }
}

/// Persistent application settings consumed by the CLI and GUI front ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Model artifact locations.
    pub models: ModelSettings,
    /// Face detector parameters.
    pub detector: DetectorSettings,
    /// Landmark regressor parameters.
    pub landmarks: LandmarkNetSettings,
    /// Overlay appearance.
    pub overlay: OverlaySettings,
    /// Telemetry and diagnostics preferences.
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load settings from a JSON file. Missing fields fall back to their defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON, overwriting any existing file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default path for persisted settings (`config/facesym_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/facesym_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/facesym_settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn default_settings_round_trip() {
        let file = NamedTempFile::new().expect("tempfile");
        let mut settings = AppSettings::default();
        settings.detector.variant = DetectorVariant::Full;
        settings.overlay.draw_boxes = true;
        settings.save_to_path(file.path()).expect("save");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.models, settings.models);
        assert_eq!(loaded.detector, settings.detector);
        assert_eq!(loaded.landmarks, settings.landmarks);
        assert_eq!(loaded.overlay, settings.overlay);
        assert_eq!(loaded.telemetry.level, settings.telemetry.level);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let file = NamedTempFile::new().expect("tempfile");
        let json = r#"{
            "models": { "base_dir": "/opt/facesym/models" },
            "detector": { "score_threshold": 0.8 }
        }"#;
        fs::write(file.path(), json).expect("write custom settings");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.models.base_dir, "/opt/facesym/models");
        assert_eq!(loaded.models.detector, ModelSettings::default().detector);
        assert_eq!(loaded.detector.score_threshold, 0.8);
        assert_eq!(loaded.detector.variant, DetectorVariant::Tiny);
        assert_eq!(loaded.landmarks.input_size, 112);
        assert!(!loaded.telemetry.enabled);
        assert_eq!(loaded.telemetry.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested/config/settings.json");
        AppSettings::default().save_to_path(&path).expect("save");
        assert!(path.exists());
    }

    #[test]
    fn detector_variant_parsing_and_dimensions() {
        assert_eq!("FAST".parse::<DetectorVariant>(), Ok(DetectorVariant::Tiny));
        assert_eq!("full".parse::<DetectorVariant>(), Ok(DetectorVariant::Full));
        assert!("huge".parse::<DetectorVariant>().is_err());

        let tiny = DetectorVariant::Tiny.input_dimensions();
        assert_eq!((tiny.width, tiny.height), (320, 320));
        assert_eq!(tiny.resize_quality, ResizeQuality::Speed);
        assert_eq!(tiny.width % 32, 0);
    }

    #[test]
    fn telemetry_level_parses_variants() {
        let telemetry = TelemetrySettings {
            level: "TRACE".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Trace);

        let telemetry = TelemetrySettings {
            level: "Warning".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Warn);
    }
}
