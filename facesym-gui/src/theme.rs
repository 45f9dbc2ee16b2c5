//! Global theme for the facesym GUI.

use egui::{Color32, Context, CornerRadius, Margin, Shadow, Stroke, Visuals};

/// Colors shared by the panels. `accent` matches the default landmark color so the score
/// heading and the drawn points read as one.
#[derive(Clone, Copy)]
pub struct Palette {
    pub canvas: Color32,
    pub panel: Color32,
    pub panel_dark: Color32,
    pub panel_light: Color32,
    pub accent: Color32,
    pub accent_soft: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub danger_soft: Color32,
    pub subtle_text: Color32,
    pub outline: Color32,
}

pub fn palette() -> Palette {
    Palette {
        canvas: Color32::from_rgb(12, 14, 20),
        panel: Color32::from_rgb(22, 26, 34),
        panel_dark: Color32::from_rgb(16, 19, 26),
        panel_light: Color32::from_rgb(40, 46, 60),
        accent: Color32::from_rgb(0, 170, 255),
        accent_soft: Color32::from_rgba_unmultiplied(0, 170, 255, 64),
        success: Color32::from_rgb(96, 208, 150),
        warning: Color32::from_rgb(240, 190, 100),
        danger: Color32::from_rgb(244, 110, 120),
        danger_soft: Color32::from_rgba_unmultiplied(244, 110, 120, 36),
        subtle_text: Color32::from_rgb(170, 180, 198),
        outline: Color32::from_rgba_unmultiplied(92, 104, 128, 140),
    }
}

/// Install the palette and spacing on `ctx`.
pub fn apply(ctx: &Context) {
    let palette = palette();
    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(16.0, 9.0);
    style.spacing.window_margin = Margin::same(16);
    style.visuals = dark_visuals(palette);

    ctx.set_style(style);
}

fn dark_visuals(palette: Palette) -> Visuals {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(228, 232, 240));
    visuals.panel_fill = palette.panel;
    visuals.extreme_bg_color = palette.canvas;
    visuals.error_fg_color = palette.danger;
    visuals.warn_fg_color = palette.warning;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = palette.panel_dark;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, palette.subtle_text);
    widgets.inactive.bg_fill = palette.panel_light;
    widgets.inactive.weak_bg_fill = palette.panel_light;
    widgets.inactive.bg_stroke = Stroke::new(1.0, palette.outline);
    widgets.hovered.weak_bg_fill = palette.accent_soft;
    widgets.hovered.bg_stroke = Stroke::new(1.0, palette.accent);
    widgets.active.weak_bg_fill = palette.accent;
    widgets.active.bg_stroke = Stroke::new(1.5, palette.accent);

    visuals.selection.bg_fill = palette.accent;
    visuals.selection.stroke = Stroke::new(1.5, palette.panel_dark);
    visuals.window_corner_radius = CornerRadius::same(14);
    visuals.window_shadow = Shadow {
        offset: [0, 6],
        blur: 20,
        spread: 1,
        color: Color32::from_black_alpha(200),
    };

    visuals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_installs_palette_visuals() {
        let ctx = Context::default();
        apply(&ctx);
        let style = ctx.style();
        assert_eq!(style.visuals.panel_fill, palette().panel);
        assert_eq!(style.visuals.selection.bg_fill, palette().accent);
        assert!(style.visuals.dark_mode);
    }
}
