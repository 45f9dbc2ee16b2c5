//! Writing the landmark overlay over the analyzed image.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use facesym_core::SessionState;

/// Composite the session's overlay onto its image and save it to `output_path`.
///
/// Returns `Ok(None)` when the state has nothing to draw (no face was scored).
pub fn save_overlay(state: &SessionState, output_path: &Path) -> Result<Option<PathBuf>> {
    let (Some(image), Some(canvas)) = (state.image(), state.overlay()) else {
        return Ok(None);
    };

    let annotated = canvas.composite_onto(image);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    annotated
        .save(output_path)
        .with_context(|| format!("failed to save annotated image {}", output_path.display()))?;

    Ok(Some(output_path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facesym_core::{
        BoundingBox, DetectedFace, FaceLandmarks, LandmarkPoint, OverlayCanvas, OverlayStyle,
        symmetry,
    };
    use image::DynamicImage;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn writes_png_for_detected_state() {
        let landmarks =
            FaceLandmarks::new(vec![LandmarkPoint::new(10.0, 10.0); 68]).expect("landmarks");
        let face = DetectedFace {
            bbox: BoundingBox {
                x: 2.0,
                y: 2.0,
                width: 20.0,
                height: 20.0,
            },
            confidence: 0.8,
            landmarks,
        };
        let image = Arc::new(DynamicImage::new_rgb8(32, 32));
        let mut canvas = OverlayCanvas::for_image(&image, OverlayStyle::default());
        canvas.draw_faces(std::slice::from_ref(&face));
        let state = SessionState::Detected {
            generation: 1,
            score: symmetry::score(&face.landmarks),
            image,
            faces: vec![face],
            canvas,
        };

        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("nested/annotated.png");
        let written = save_overlay(&state, &out).expect("save overlay");
        assert_eq!(written.as_deref(), Some(out.as_path()));

        let saved = image::open(&out).expect("reopen").to_rgba8();
        assert_eq!(saved.dimensions(), (32, 32));
        assert_ne!(saved.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn skips_states_without_overlay() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("annotated.png");
        let written = save_overlay(&SessionState::Idle, &out).expect("no-op");
        assert!(written.is_none());
        assert!(!out.exists());
    }
}
