use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::engine::Theme;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Spawn and pop fades.
pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub(super) fn background_color(theme: Theme) -> Color32 {
    match theme {
        Theme::Dark => Color32::from_rgb(19, 23, 29),
        Theme::Light => Color32::from_rgb(244, 245, 248),
    }
}

pub(super) fn text_color(theme: Theme) -> Color32 {
    match theme {
        Theme::Dark => Color32::from_gray(238),
        Theme::Light => Color32::from_gray(32),
    }
}

pub(super) fn trend_color(percent: f64) -> Color32 {
    if percent >= 0.0 {
        Color32::from_rgb(96, 204, 128)
    } else {
        Color32::from_rgb(236, 104, 96)
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, theme: Theme) {
    painter.rect_filled(rect, 0.0, background_color(theme));

    let grid = match theme {
        Theme::Dark => Color32::from_rgba_unmultiplied(60, 70, 80, 70),
        Theme::Light => Color32::from_rgba_unmultiplied(180, 186, 196, 70),
    };
    let step = 56.0;

    let mut x = rect.left() + step;
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, grid),
        );
        x += step;
    }

    let mut y = rect.top() + step;
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, grid),
        );
        y += step;
    }
}
