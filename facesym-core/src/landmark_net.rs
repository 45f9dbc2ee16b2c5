//! 68-point landmark regression on detector face crops.

use std::path::Path;

use anyhow::Result;
use image::DynamicImage;
use log::debug;

use crate::{
    landmarks::{BoundingBox, LANDMARK_COUNT, LandmarkPoint},
    model::OnnxModel,
    preprocess::{CropRegion, prepare_landmark_input},
};
use facesym_utils::{
    config::{LandmarkNetSettings, TensorLayout},
    timing_guard,
};

/// Values beyond this magnitude are treated as input-pixel coordinates instead of normalized.
const NORMALIZED_LIMIT: f32 = 2.0;

/// Landmark regression graph plus its effective input settings.
#[derive(Debug)]
pub struct LandmarkRegressor {
    model: OnnxModel,
    settings: LandmarkNetSettings,
}

impl LandmarkRegressor {
    /// Load the graph. A fixed input shape in the graph overrides the configured size and layout.
    pub fn new<P: AsRef<Path>>(model_path: P, settings: &LandmarkNetSettings) -> Result<Self> {
        let model = OnnxModel::load(model_path, "landmark")?;
        let mut settings = settings.clone();
        match model.input_shape().as_deref() {
            Some(&[1, 3, h, w]) if h == w => {
                settings.input_size = h as u32;
                settings.layout = TensorLayout::Nchw;
            }
            Some(&[1, h, w, 3]) if h == w => {
                settings.input_size = h as u32;
                settings.layout = TensorLayout::Nhwc;
            }
            Some(other) => debug!("landmark graph declares input {other:?}; using configured size"),
            None => {}
        }
        Ok(Self { model, settings })
    }

    /// Regress 68 points for the face inside `bbox`, in image pixel coordinates.
    pub fn regress(&self, image: &DynamicImage, bbox: &BoundingBox) -> Result<Vec<LandmarkPoint>> {
        let _guard = timing_guard("facesym_core::landmark_regression", log::Level::Debug);
        let input = prepare_landmark_input(image, bbox, &self.settings)?;
        let outputs = self.model.run(input.tensor)?;
        let values = outputs[0]
            .as_slice::<f32>()
            .map_err(|e| anyhow::anyhow!("landmark output is not f32: {e}"))?;
        decode_landmark_output(values, &input.region, self.settings.input_size)
    }
}

/// Interpret the first 136 regressor values as (x, y) pairs inside `region`.
pub fn decode_landmark_output(
    values: &[f32],
    region: &CropRegion,
    input_size: u32,
) -> Result<Vec<LandmarkPoint>> {
    let needed = LANDMARK_COUNT * 2;
    anyhow::ensure!(
        values.len() >= needed,
        "landmark output has {} values, expected at least {needed}",
        values.len()
    );
    let values = &values[..needed];

    let max_abs = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    let divisor = if max_abs > NORMALIZED_LIMIT {
        input_size.max(1) as f32
    } else {
        1.0
    };

    Ok(values
        .chunks_exact(2)
        .map(|pair| {
            let (x, y) = region.to_image(pair[0] / divisor, pair[1] / divisor);
            LandmarkPoint::new(x, y)
        })
        .collect())
}
