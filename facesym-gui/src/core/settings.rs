//! Settings loading and persistence.

use anyhow::{Context as AnyhowContext, Result};
use facesym_utils::config::AppSettings;
use log::{info, warn};
use std::path::Path;

/// Loads application settings from a file, or returns default settings if it is absent or invalid.
///
/// A missing file is seeded with the defaults so there is something to edit next time.
pub fn load_settings(path: &Path) -> AppSettings {
    if !path.exists() {
        info!(
            "No settings file at {}; writing built-in defaults",
            path.display()
        );
        let defaults = AppSettings::default();
        if let Err(err) = persist_settings(&defaults, path) {
            warn!("{err:#}");
        }
        return defaults;
    }
    match AppSettings::load_from_path(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(
                "Failed to load settings from {}: {err:?}. Falling back to defaults.",
                path.display()
            );
            AppSettings::default()
        }
    }
}

/// Saves `settings` as JSON at `settings_path`.
pub fn persist_settings(settings: &AppSettings, settings_path: &Path) -> Result<()> {
    settings
        .save_to_path(settings_path)
        .with_context(|| format!("failed to write settings to {}", settings_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_seeded_with_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config/absent.json");
        let settings = load_settings(&path);
        assert_eq!(settings.models.base_dir, "models");
        assert!(path.is_file());

        let seeded = AppSettings::load_from_path(&path).expect("seeded settings parse");
        assert_eq!(seeded.detector.top_k, settings.detector.top_k);
    }

    #[test]
    fn invalid_json_yields_defaults_and_is_left_alone() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");
        let settings = load_settings(&path);
        assert_eq!(settings.detector.top_k, 5_000);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{ not json");
    }

    #[test]
    fn persisted_values_are_loaded_back() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let mut stored = AppSettings::default();
        stored.overlay.point_radius = 4;
        persist_settings(&stored, &path).expect("persist");
        assert_eq!(load_settings(&path).overlay.point_radius, 4);
    }
}
