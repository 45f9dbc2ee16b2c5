use anyhow::Result;
use std::cmp::Ordering;
use tract_onnx::prelude::{Tensor, tract_ndarray::ArrayView2};

use crate::{landmarks::BoundingBox, model::DETECTION_COLS, provider::DetectorOptions};

/// Filtering applied to raw detector rows.
#[derive(Debug, Clone)]
pub struct PostprocessConfig {
    /// Minimum confidence score for a detection to be considered valid.
    pub score_threshold: f32,
    /// Threshold for non-maximum suppression to merge overlapping bounding boxes.
    pub nms_threshold: f32,
    /// The maximum number of detections kept after sorting by score.
    pub top_k: usize,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        DetectorOptions::default().into()
    }
}

impl From<&DetectorOptions> for PostprocessConfig {
    fn from(options: &DetectorOptions) -> Self {
        Self {
            score_threshold: options.score_threshold,
            nms_threshold: options.nms_threshold,
            top_k: options.top_k,
        }
    }
}

impl From<DetectorOptions> for PostprocessConfig {
    fn from(options: DetectorOptions) -> Self {
        (&options).into()
    }
}

/// A face box in source image coordinates, before landmark regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCandidate {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Filter, rescale, sort and suppress decoded detector rows.
///
/// # Arguments
///
/// * `output` - `[N, 15]` or `[1, N, 15]` detector rows in model input space.
/// * `scale_x` - The horizontal scale factor to map coordinates to the original image.
/// * `scale_y` - The vertical scale factor to map coordinates to the original image.
/// * `config` - The post-processing parameters.
pub fn apply_postprocess(
    output: &Tensor,
    scale_x: f32,
    scale_y: f32,
    config: &PostprocessConfig,
) -> Result<Vec<FaceCandidate>> {
    let rows = detection_rows(output)?;

    let mut candidates = Vec::with_capacity(rows.nrows());
    for row in rows.rows() {
        let score = row[14];
        if !score.is_finite() || score < config.score_threshold {
            continue;
        }

        let bbox = BoundingBox {
            x: row[0] * scale_x,
            y: row[1] * scale_y,
            width: row[2] * scale_x,
            height: row[3] * scale_y,
        };
        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            continue;
        }

        candidates.push(FaceCandidate { bbox, score });
    }

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    if config.top_k > 0 && candidates.len() > config.top_k {
        candidates.truncate(config.top_k);
    }

    if config.nms_threshold > 0.0 && candidates.len() > 1 {
        candidates = non_max_suppression(candidates, config.nms_threshold);
    }

    Ok(candidates)
}

fn detection_rows(output: &Tensor) -> Result<ArrayView2<'_, f32>> {
    let rows = match output.shape() {
        [rows, DETECTION_COLS] => *rows,
        [1, rows, DETECTION_COLS] => *rows,
        other => anyhow::bail!(
            "detector output must have shape [N, 15] or [1, N, 15] (got {:?})",
            other
        ),
    };

    let slice = output
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("detector output is not f32: {e}"))?;

    ArrayView2::from_shape((rows, DETECTION_COLS), slice)
        .map_err(|_| anyhow::anyhow!("detector output data is not contiguous"))
}

fn non_max_suppression(candidates: Vec<FaceCandidate>, threshold: f32) -> Vec<FaceCandidate> {
    let mut kept: Vec<FaceCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|existing| candidate.bbox.iou(&existing.bbox) <= threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
