//! Access to the workspace `fixtures/` tree (sample images and landmark sets) from tests
//! and benchmarks of any member crate.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Overrides the fixture root, e.g. when tests run from an unpacked crate.
const FIXTURE_ENV: &str = "FACESYM_FIXTURE_ROOT";

/// Directory holding the fixtures: `$FACESYM_FIXTURE_ROOT`, or the nearest `fixtures/`
/// above this crate's manifest.
pub fn fixtures_dir() -> Result<PathBuf> {
    if let Some(root) = env::var_os(FIXTURE_ENV) {
        return Ok(PathBuf::from(root));
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .map(|dir| dir.join("fixtures"))
        .find(|candidate| candidate.is_dir())
        .with_context(|| {
            format!(
                "no fixtures directory above {}",
                manifest_dir.display()
            )
        })
}

/// Absolute path of an existing fixture.
pub fn fixture_path<P: AsRef<Path>>(relative: P) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let root = fixtures_dir()?;
    let full = root.join(relative);
    anyhow::ensure!(
        full.is_file(),
        "fixture {} does not exist under {}",
        relative.display(),
        root.display()
    );
    Ok(full)
}

/// Raw bytes of a fixture, as a file picker would hand them over.
pub fn load_fixture_bytes<P: AsRef<Path>>(relative: P) -> Result<Vec<u8>> {
    let path = fixture_path(relative)?;
    fs::read(&path).with_context(|| format!("failed to read fixture {}", path.display()))
}

/// Deserialize a JSON fixture.
pub fn load_fixture_json<P, T>(relative: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let bytes = load_fixture_bytes(relative.as_ref())?;
    serde_json::from_slice(&bytes).with_context(|| {
        format!(
            "failed to parse JSON fixture {}",
            relative.as_ref().display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct LandmarkFixture {
        image_size: [u32; 2],
        points: Vec<[f32; 2]>,
    }

    #[test]
    fn resolves_the_blank_image() {
        let path = fixture_path("images/blank_64.png").expect("blank image should exist");
        assert!(path.ends_with(Path::new("images/blank_64.png")));
        let bytes = load_fixture_bytes("images/blank_64.png").expect("bytes");
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn missing_fixture_is_an_error() {
        assert!(fixture_path("images/missing.png").is_err());
        assert!(fixture_path("images").is_err());
    }

    #[test]
    fn landmark_fixtures_have_68_points_inside_the_image() {
        for name in ["reference_face", "thumbnail_face"] {
            let fixture: LandmarkFixture =
                load_fixture_json(format!("landmarks/{name}.json")).expect("load landmarks");
            assert_eq!(fixture.points.len(), 68, "{name}");
            let [w, h] = fixture.image_size;
            assert!(
                fixture
                    .points
                    .iter()
                    .all(|[x, y]| *x >= 0.0 && *y >= 0.0 && *x < w as f32 && *y < h as f32),
                "{name}"
            );
        }
    }
}
