use std::path::Path;

use anyhow::Result;
use image::DynamicImage;
use log::debug;

use crate::model::YuNetModel;
use crate::postprocess::{FaceCandidate, PostprocessConfig, apply_postprocess};
use crate::preprocess::{PreprocessConfig, preprocess_dynamic_image};
use crate::provider::DetectorOptions;
use facesym_utils::timing_guard;

/// Couples the YuNet graph with preprocessing and postprocessing.
#[derive(Debug)]
pub struct FaceDetector {
    model: YuNetModel,
}

impl FaceDetector {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Ok(Self {
            model: YuNetModel::load(model_path)?,
        })
    }

    /// Preprocessing for `options`. A graph with a fixed input shape overrides the variant's
    /// resolution.
    pub fn preprocess_config(&self, options: &DetectorOptions) -> PreprocessConfig {
        let mut config: PreprocessConfig = options.input_dimensions().into();
        if let Some(declared) = self.model.declared_input_size()
            && declared != config.input_size
        {
            debug!(
                "detector graph fixes input at {}x{}; ignoring {} variant size",
                declared.width,
                declared.height,
                options.variant.as_label()
            );
            config.input_size = declared;
        }
        config
    }

    /// Detect face boxes in `image`, in source image coordinates, best first.
    pub fn detect(
        &self,
        image: &DynamicImage,
        options: &DetectorOptions,
    ) -> Result<Vec<FaceCandidate>> {
        let _guard = timing_guard("facesym_core::detect_faces", log::Level::Debug);
        let config = self.preprocess_config(options);
        let prep = preprocess_dynamic_image(image, &config)?;

        let raw = {
            let _guard = timing_guard("facesym_core::detector_inference", log::Level::Debug);
            self.model.run(prep.tensor, config.input_size)?
        };

        let postprocess = PostprocessConfig::from(options);
        apply_postprocess(&raw, prep.scale_x, prep.scale_y, &postprocess)
    }
}
