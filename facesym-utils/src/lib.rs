//! Common helpers shared across the facesym crates.

/// Persistent settings shared by the CLI and the GUI.
pub mod config;
/// Locating and loading test fixtures.
pub mod fixtures;
/// Image decoding, sniffing, resizing, and tensor conversion.
pub mod image_utils;
/// Opt-in timing logs.
pub mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;

pub use fixtures::{fixture_path, fixtures_dir, load_fixture_bytes, load_fixture_json};
pub use image_utils::{
    compute_resize_scales, decode_image_bytes, guess_media_type, resize_image, rgb_to_bgr_chw,
    rgb_to_scaled_chw, rgb_to_scaled_hwc,
};
pub use telemetry::{TimingGuard, timing_guard};

/// Install the `env_logger` backend used by both front ends.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. The telemetry target is
/// always let through so that `--telemetry` works without touching `RUST_LOG`. Calling this
/// more than once is harmless.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
    Ok(())
}

/// Canonicalize `path`, failing when it does not exist.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    path.canonicalize()
        .with_context(|| format!("failed to resolve {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_rejects_missing_entries() {
        let err = normalize_path("definitely/not/here.png").expect_err("missing path");
        assert!(format!("{err}").contains("path does not exist"));
    }

    #[test]
    fn normalize_path_returns_absolute_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolved = normalize_path(dir.path()).expect("existing dir");
        assert!(resolved.is_absolute());
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(LevelFilter::Warn).expect("first init");
        init_logging(LevelFilter::Debug).expect("second init is a no-op");
    }
}
