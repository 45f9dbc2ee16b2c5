//! Tensor preparation for the detector and the landmark regressor.
//!
//! Detector input is the whole image resized to the variant's resolution in BGR CHW order with
//! raw `0..=255` values. Landmark input is a square crop around each face box, resized to the
//! regressor's edge length and scaled RGB in the layout the graph declares.

use std::borrow::Cow;

use anyhow::Result;
use image::{DynamicImage, GenericImageView, RgbImage, imageops::FilterType};
use tract_onnx::prelude::Tensor;

use crate::landmarks::BoundingBox;
use facesym_utils::{
    compute_resize_scales,
    config::{InputDimensions, LandmarkNetSettings, ResizeQuality, TensorLayout},
    resize_image, rgb_to_bgr_chw, rgb_to_scaled_chw, rgb_to_scaled_hwc,
    telemetry::timing_guard,
};

/// Model input resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for InputSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 640,
        }
    }
}

impl From<InputDimensions> for InputSize {
    fn from(dimensions: InputDimensions) -> Self {
        InputSize::new(dimensions.width, dimensions.height)
    }
}

/// Detector preprocessing configuration.
#[derive(Debug, Clone, Default)]
pub struct PreprocessConfig {
    pub input_size: InputSize,
    /// Resize filter preference controlling the quality vs speed trade-off.
    pub resize_quality: ResizeQuality,
}

impl PreprocessConfig {
    fn resize_filter(&self) -> FilterType {
        match self.resize_quality {
            ResizeQuality::Quality => FilterType::Triangle,
            ResizeQuality::Speed => FilterType::Nearest,
        }
    }
}

impl From<InputDimensions> for PreprocessConfig {
    fn from(dimensions: InputDimensions) -> Self {
        PreprocessConfig {
            input_size: dimensions.into(),
            resize_quality: dimensions.resize_quality,
        }
    }
}

/// Detector tensor plus the factors that map detections back to the source image.
#[derive(Debug)]
pub struct PreprocessOutput {
    pub tensor: Tensor,
    pub scale_x: f32,
    pub scale_y: f32,
    pub original_size: (u32, u32),
}

/// Build the `[1, 3, H, W]` BGR detector tensor for `image`.
pub fn preprocess_dynamic_image(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<PreprocessOutput> {
    let _guard = timing_guard("facesym_core::preprocess_dynamic_image", log::Level::Trace);
    let input_w = config.input_size.width;
    let input_h = config.input_size.height;
    anyhow::ensure!(
        input_w > 0 && input_h > 0,
        "input dimensions must be greater than zero"
    );

    let (orig_w, orig_h) = image.dimensions();
    anyhow::ensure!(
        orig_w > 0 && orig_h > 0,
        "source image dimensions must be greater than zero"
    );
    let resized_rgb: Cow<'_, RgbImage> = if orig_w == input_w && orig_h == input_h {
        match image.as_rgb8() {
            Some(rgb) => Cow::Borrowed(rgb),
            None => Cow::Owned(image.to_rgb8()),
        }
    } else {
        Cow::Owned(resize_image(image, input_w, input_h, config.resize_filter()))
    };
    let chw = rgb_to_bgr_chw(&resized_rgb);

    let shape = [1usize, 3, input_h as usize, input_w as usize];
    let (data, _) = chw.into_raw_vec_and_offset();
    let tensor = Tensor::from_shape(&shape, &data)
        .map_err(|e| anyhow::anyhow!("failed to build tensor: {e}"))?;

    let (scale_x, scale_y) = compute_resize_scales((orig_w, orig_h), (input_w, input_h))?;

    Ok(PreprocessOutput {
        tensor,
        scale_x,
        scale_y,
        original_size: (orig_w, orig_h),
    })
}

/// Image-space rectangle a landmark crop was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Square region around `bbox`, grown by `margin` of the box size on each side and
    /// clipped to the image.
    pub fn around(bbox: &BoundingBox, margin: f32, image_size: (u32, u32)) -> Option<Self> {
        let (img_w, img_h) = image_size;
        if img_w == 0 || img_h == 0 {
            return None;
        }
        let (cx, cy) = bbox.center();
        let side = bbox.width.max(bbox.height) * (1.0 + 2.0 * margin.max(0.0));
        if !side.is_finite() || side < 1.0 {
            return None;
        }
        let half = side * 0.5;
        let x1 = (cx - half).floor().clamp(0.0, (img_w - 1) as f32);
        let y1 = (cy - half).floor().clamp(0.0, (img_h - 1) as f32);
        let x2 = (cx + half).ceil().clamp(x1 + 1.0, img_w as f32);
        let y2 = (cy + half).ceil().clamp(y1 + 1.0, img_h as f32);
        Some(Self {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }

    /// Map a normalized `[0, 1]` crop coordinate back to image pixels.
    pub fn to_image(&self, nx: f32, ny: f32) -> (f32, f32) {
        (
            self.x as f32 + nx * self.width as f32,
            self.y as f32 + ny * self.height as f32,
        )
    }
}

/// Landmark tensor for one face.
#[derive(Debug)]
pub struct LandmarkInput {
    pub tensor: Tensor,
    pub region: CropRegion,
}

/// Crop `bbox` out of `image` and build the landmark regressor input.
pub fn prepare_landmark_input(
    image: &DynamicImage,
    bbox: &BoundingBox,
    settings: &LandmarkNetSettings,
) -> Result<LandmarkInput> {
    let _guard = timing_guard("facesym_core::prepare_landmark_input", log::Level::Trace);
    let size = settings.input_size;
    anyhow::ensure!(size > 0, "landmark input size must be greater than zero");

    let region = CropRegion::around(bbox, settings.crop_margin, image.dimensions())
        .ok_or_else(|| anyhow::anyhow!("face box {bbox:?} does not overlap the image"))?;
    let crop = image.crop_imm(region.x, region.y, region.width, region.height);
    let resized = resize_image(&crop, size, size, FilterType::Triangle);

    let edge = size as usize;
    let (array, shape) = match settings.layout {
        TensorLayout::Nchw => (
            rgb_to_scaled_chw(&resized, settings.pixel_scale),
            [1usize, 3, edge, edge],
        ),
        TensorLayout::Nhwc => (
            rgb_to_scaled_hwc(&resized, settings.pixel_scale),
            [1usize, edge, edge, 3],
        ),
    };
    let (data, _) = array.into_raw_vec_and_offset();
    let tensor = Tensor::from_shape(&shape, &data)
        .map_err(|e| anyhow::anyhow!("failed to build landmark tensor: {e}"))?;

    Ok(LandmarkInput { tensor, region })
}
