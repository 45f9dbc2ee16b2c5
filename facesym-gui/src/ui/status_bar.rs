//! Header with the title, model status, upload control and error banner.

use egui::{
    Align, Button, CornerRadius, Layout, Margin, RichText, Spinner, Stroke, TopBottomPanel, Ui,
};
use facesym_core::{APP_TITLE, LOADING_MESSAGE, LandmarkProvider, SessionState};

use crate::{FaceSymApp, theme};

impl<P: LandmarkProvider + 'static> FaceSymApp<P> {
    /// Renders the top bar.
    pub fn show_status_bar(&mut self, ctx: &egui::Context) {
        let palette = theme::palette();
        TopBottomPanel::top("facesym_status_bar")
            .frame(
                egui::Frame::new()
                    .fill(palette.panel_dark)
                    .stroke(Stroke::new(1.0, palette.outline))
                    .inner_margin(Margin::symmetric(20, 16)),
            )
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing.y = 8.0;
                    ui.horizontal(|ui| {
                        ui.heading(RichText::new(APP_TITLE).size(26.0).strong());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            self.draw_status_badge(ui, palette);
                        });
                    });

                    let state = self.orchestrator.state();
                    let loading = matches!(state, SessionState::ModelsLoading);
                    let can_upload = state.can_upload();
                    if let Some(message) = state.error_message() {
                        draw_error_banner(ui, palette, message);
                    }

                    if loading {
                        ui.horizontal(|ui| {
                            ui.add(Spinner::new().size(20.0));
                            ui.label(RichText::new(LOADING_MESSAGE).size(16.0));
                        });
                    } else if can_upload {
                        self.draw_upload_button(ui);
                    }
                });
            });
    }

    fn draw_upload_button(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let upload = Button::new(RichText::new("Upload Photo").size(16.0).strong());
            if ui.add(upload).clicked() {
                self.open_file_dialog();
            }
            ui.label(
                RichText::new("or drop an image onto the window")
                    .color(theme::palette().subtle_text),
            );
        });
    }

    fn draw_status_badge(&self, ui: &mut Ui, palette: theme::Palette) {
        let state = self.orchestrator.state();
        let (label, color) = match state {
            SessionState::ModelsLoading => ("Loading models", palette.warning),
            SessionState::InitFailed { .. } => ("Models unavailable", palette.danger),
            SessionState::Decoding { .. } | SessionState::Detecting { .. } => {
                ("Analyzing...", palette.accent)
            }
            _ => ("Ready", palette.success),
        };

        egui::Frame::new()
            .fill(palette.panel_light)
            .stroke(Stroke::new(1.0, color))
            .corner_radius(CornerRadius::same(64))
            .inner_margin(Margin::symmetric(14, 6))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if state.is_busy() {
                        ui.add(Spinner::new().size(16.0));
                    }
                    ui.label(RichText::new(label).size(15.0).strong());
                });
            });
    }
}

fn draw_error_banner(ui: &mut Ui, palette: theme::Palette, message: &str) {
    egui::Frame::new()
        .fill(palette.danger_soft)
        .stroke(Stroke::new(1.0, palette.danger))
        .corner_radius(CornerRadius::same(10))
        .inner_margin(Margin::symmetric(12, 8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.colored_label(palette.danger, message);
        });
}
