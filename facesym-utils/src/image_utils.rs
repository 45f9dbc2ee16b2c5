//! Image decoding, content sniffing and the tensor layouts the ONNX graphs consume.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage, imageops::FilterType};
use ndarray::Array3;

/// Decode an in-memory encoded image (PNG, JPEG, ...).
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    anyhow::ensure!(!bytes.is_empty(), "image buffer is empty");
    image::load_from_memory(bytes).context("failed to decode image bytes")
}

/// Sniff the media type of an encoded image from its leading bytes.
///
/// Returns `None` when the content does not look like a supported image format.
pub fn guess_media_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        ImageFormat::Pnm => "image/x-portable-anymap",
        ImageFormat::Tga => "image/x-tga",
        ImageFormat::Qoi => "image/qoi",
        _ => "image/unknown",
    })
}

/// Resize an image to the requested resolution using the provided filter.
///
/// # Arguments
///
/// * `image` - The image to resize.
/// * `width` - The target width.
/// * `height` - The target height.
/// * `filter` - The sampling filter to use for resizing.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    image.resize_exact(width, height, filter).to_rgb8()
}

/// Convert an RGB image into a BGR CHW array with raw `0..=255` values.
///
/// This is the layout OpenCV's `blobFromImage` produces and what the face detector expects.
pub fn rgb_to_bgr_chw(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        array[(0, yi, xi)] = pixel[2] as f32;
        array[(1, yi, xi)] = pixel[1] as f32;
        array[(2, yi, xi)] = pixel[0] as f32;
    }
    array
}

/// Convert an RGB image into an RGB CHW array with every channel multiplied by `scale`.
pub fn rgb_to_scaled_chw(image: &RgbImage, scale: f32) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        for channel in 0..3 {
            array[(channel, yi, xi)] = pixel[channel] as f32 * scale;
        }
    }
    array
}

/// Convert an RGB image into an RGB HWC array with every channel multiplied by `scale`.
pub fn rgb_to_scaled_hwc(image: &RgbImage, scale: f32) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        for channel in 0..3 {
            array[(yi, xi, channel)] = pixel[channel] as f32 * scale;
        }
    }
    array
}

/// Compute scale factors used to reproject detections from model space to original space.
///
/// # Arguments
///
/// * `original` - A tuple of the original image's (width, height).
/// * `target` - A tuple of the resized image's (width, height).
pub fn compute_resize_scales(original: (u32, u32), target: (u32, u32)) -> Result<(f32, f32)> {
    let (orig_w, orig_h) = original;
    let (target_w, target_h) = target;
    anyhow::ensure!(
        target_w > 0 && target_h > 0,
        "target dimensions must be non-zero"
    );
    anyhow::ensure!(
        orig_w > 0 && orig_h > 0,
        "original dimensions must be non-zero"
    );
    Ok((
        orig_w as f32 / target_w as f32,
        orig_h as f32 / target_h as f32,
    ))
}
