//! Transparent landmark overlay painted on top of the displayed image.

use image::{DynamicImage, Rgba, RgbaImage, imageops};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut},
    rect::Rect,
};

use crate::landmarks::{BoundingBox, DetectedFace, LandmarkPoint};
use facesym_utils::config::OverlaySettings;

/// Appearance of landmark dots and optional detection boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub point_color: Rgba<u8>,
    pub point_radius: i32,
    pub draw_boxes: bool,
    pub box_color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlaySettings::default().into()
    }
}

impl From<OverlaySettings> for OverlayStyle {
    fn from(settings: OverlaySettings) -> Self {
        Self {
            point_color: Rgba(settings.point_color),
            point_radius: settings.point_radius.max(1),
            draw_boxes: settings.draw_boxes,
            box_color: Rgba(settings.box_color),
        }
    }
}

impl From<&OverlaySettings> for OverlayStyle {
    fn from(settings: &OverlaySettings) -> Self {
        settings.clone().into()
    }
}

/// RGBA drawing surface matching the displayed image size.
///
/// Every successful detection redraws the whole surface; nothing is patched incrementally.
#[derive(Debug, Clone)]
pub struct OverlayCanvas {
    pixels: RgbaImage,
    style: OverlayStyle,
}

impl OverlayCanvas {
    pub fn new(width: u32, height: u32, style: OverlayStyle) -> Self {
        let mut canvas = Self {
            pixels: RgbaImage::new(0, 0),
            style,
        };
        canvas.resize_to(width, height);
        canvas
    }

    /// Canvas sized to `image`.
    pub fn for_image(image: &DynamicImage, style: OverlayStyle) -> Self {
        Self::new(image.width(), image.height(), style)
    }

    /// Resize and clear to fully transparent.
    pub fn resize_to(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Number of pixels that are not fully transparent.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.pixels().filter(|p| p[3] > 0).count()
    }

    /// Paint one dot per point. Points outside the canvas are clamped to its edge.
    pub fn draw_points(&mut self, points: &[LandmarkPoint]) {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        for point in points {
            let center = (clamp_to_i32(point.x, width), clamp_to_i32(point.y, height));
            draw_filled_circle_mut(
                &mut self.pixels,
                center,
                self.style.point_radius,
                self.style.point_color,
            );
        }
    }

    pub fn draw_box(&mut self, bbox: &BoundingBox) {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let rect = rect_from_bbox(bbox, width, height);
        draw_hollow_rect_mut(&mut self.pixels, rect, self.style.box_color);
    }

    /// Paint the landmarks (and boxes when enabled) of every face.
    pub fn draw_faces(&mut self, faces: &[DetectedFace]) {
        for face in faces {
            if self.style.draw_boxes {
                self.draw_box(&face.bbox);
            }
            self.draw_points(face.landmarks.points());
        }
    }

    /// Alpha-blend the overlay over `base`.
    pub fn composite_onto(&self, base: &DynamicImage) -> RgbaImage {
        let mut output = base.to_rgba8();
        imageops::overlay(&mut output, &self.pixels, 0, 0);
        output
    }
}

fn rect_from_bbox(bbox: &BoundingBox, img_w: u32, img_h: u32) -> Rect {
    let max_x = (img_w - 1) as f32;
    let max_y = (img_h - 1) as f32;

    let x1 = bbox.x.clamp(0.0, max_x);
    let y1 = bbox.y.clamp(0.0, max_y);
    let x2 = (bbox.x + bbox.width).clamp(0.0, max_x);
    let y2 = (bbox.y + bbox.height).clamp(0.0, max_y);

    let width = (x2 - x1).max(1.0).round() as u32;
    let height = (y2 - y1).max(1.0).round() as u32;

    Rect::at(x1.round() as i32, y1.round() as i32).of_size(width, height)
}

#[inline]
fn clamp_to_i32(value: f32, max_extent: u32) -> i32 {
    let max = (max_extent - 1) as f32;
    value.clamp(0.0, max).round() as i32
}
