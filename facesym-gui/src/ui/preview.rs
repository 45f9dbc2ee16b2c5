//! Preview panel: uploaded image, landmark overlay and score.

use egui::{
    CentralPanel, Color32, CornerRadius, Margin, Rect, RichText, Spinner, Stroke, Ui, pos2,
};
use facesym_core::LandmarkProvider;

use crate::{FaceSymApp, theme};

impl<P: LandmarkProvider + 'static> FaceSymApp<P> {
    /// Renders the status bar and the central preview.
    pub fn show_main_panel(&mut self, ctx: &egui::Context) {
        self.show_status_bar(ctx);

        let palette = theme::palette();
        CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(palette.canvas)
                    .inner_margin(Margin::same(20)),
            )
            .show(ctx, |ui| {
                if let Some(score) = self.orchestrator.state().score() {
                    ui.vertical_centered(|ui| {
                        ui.heading(
                            RichText::new(format!("Symmetry Score: {score}"))
                                .size(30.0)
                                .strong()
                                .color(palette.accent),
                        );
                    });
                    ui.add_space(12.0);
                }

                egui::Frame::new()
                    .fill(palette.panel_dark)
                    .stroke(Stroke::new(1.0, palette.outline))
                    .corner_radius(CornerRadius::same(28))
                    .inner_margin(Margin::symmetric(18, 18))
                    .show(ui, |ui| {
                        ui.set_min_size(ui.available_size());
                        self.render_preview_area(ui, palette);
                    });
            });
    }

    fn render_preview_area(&self, ui: &mut Ui, palette: theme::Palette) {
        if let Some(texture) = self.preview.image.as_ref() {
            let available = ui.available_size();
            let tex_size = texture.size_vec2();
            if available.x <= 0.0 || available.y <= 0.0 || tex_size.x <= 0.0 || tex_size.y <= 0.0
            {
                return;
            }
            let scale = fit_scale(tex_size.x, tex_size.y, available.x, available.y);
            let scaled = tex_size * scale;
            ui.centered_and_justified(|ui| {
                let response = ui.add(egui::Image::new(texture).fit_to_exact_size(scaled));
                let image_rect = Rect::from_center_size(response.rect.center(), scaled);
                if let Some(overlay) = self.preview.overlay.as_ref() {
                    ui.painter().image(
                        overlay.id(),
                        image_rect,
                        Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
            });
        } else if self.orchestrator.state().is_busy() {
            ui.vertical_centered(|ui| {
                ui.add_space(64.0);
                ui.add(Spinner::new().size(28.0));
                ui.label(RichText::new("Analyzing image...").size(16.0));
            });
        } else if self.orchestrator.state().can_upload() {
            ui.vertical_centered(|ui| {
                ui.add_space(64.0);
                ui.heading("Upload a photo to measure its facial symmetry.");
                ui.label(
                    RichText::new("Landmarks of every detected face are drawn over the image.")
                        .color(palette.subtle_text),
                );
            });
        }
    }
}

/// Largest scale that fits `width`x`height` inside the available area.
pub(crate) fn fit_scale(width: f32, height: f32, max_width: f32, max_height: f32) -> f32 {
    let scale = (max_width / width).min(max_height / height).max(0.0);
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}
