use std::collections::HashSet;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Shape, Stroke, Vec2, pos2, vec2};

use crate::engine::{Bubble, BubbleShape, Engine, Theme};

use super::super::render_utils::{
    background_color, blend_color, dim_color, text_color, trend_color, with_opacity,
};
use super::label::wrap_label;

const MAX_LABEL_LINES: usize = 3;
const MIN_LABELED_RADIUS: f32 = 16.0;
const GLOW_LAYERS: usize = 4;
const GRADIENT_LAYERS: usize = 5;
/// Brightness lost by the end of a bubble's life on the dark theme.
const AGE_FADE: f32 = 0.35;
const PINNED_RING: Color32 = Color32::from_rgb(245, 206, 93);
const COMPARE_RING: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) struct PaintStyle<'a> {
    pub origin: Pos2,
    pub theme: Theme,
    pub shape: BubbleShape,
    /// Topics matching the active search, if any.
    pub matches: Option<&'a HashSet<usize>>,
}

pub(super) fn paint_bubbles(painter: &Painter, engine: &Engine, style: &PaintStyle<'_>) {
    for bubble in engine.bubbles() {
        paint_bubble(painter, engine, bubble, style);
    }
}

fn paint_bubble(painter: &Painter, engine: &Engine, bubble: &Bubble, style: &PaintStyle<'_>) {
    let radius = bubble.display_radius();
    let opacity = bubble.opacity();
    if radius < 0.5 || opacity <= 0.0 {
        return;
    }
    let center = style.origin + bubble.pos.to_vec2();

    let mut color = bubble.color;
    if style.theme == Theme::Dark {
        let fade = bubble.age_fraction(engine.now()) * AGE_FADE;
        color = blend_color(color, background_color(style.theme), fade);
    }
    if let Some(matches) = style.matches {
        color = if matches.contains(&bubble.topic_index) {
            blend_color(color, COMPARE_RING, 0.35)
        } else {
            dim_color(color, 0.38)
        };
    }
    if bubble.hovered {
        color = blend_color(color, Color32::WHITE, 0.18);
    }
    let color = with_opacity(color, opacity);

    match style.theme {
        Theme::Dark => {
            for layer in (1..=GLOW_LAYERS).rev() {
                let spread = 1.0 + layer as f32 * 0.07;
                let alpha = 0.16 / layer as f32;
                fill_shape(painter, style.shape, center, radius * spread, with_opacity(color, alpha));
            }
            fill_shape(painter, style.shape, center, radius, color);
            // Lighter discs drifting toward the upper left read as a radial gradient.
            for layer in 1..=GRADIENT_LAYERS {
                let t = layer as f32 / (GRADIENT_LAYERS + 1) as f32;
                let offset = vec2(-0.22, -0.26) * radius * t;
                let highlight = blend_color(color, Color32::WHITE, t * 0.32);
                fill_shape(
                    painter,
                    style.shape,
                    center + offset,
                    radius * (1.0 - t * 0.8),
                    highlight,
                );
            }
        }
        Theme::Light => {
            fill_shape(painter, style.shape, center, radius, color);
            outline_shape(
                painter,
                style.shape,
                center,
                radius,
                Stroke::new(1.0, with_opacity(dim_color(bubble.color, 0.7), opacity)),
            );
        }
    }

    if bubble.pinned {
        outline_shape(
            painter,
            style.shape,
            center,
            radius + 3.0,
            Stroke::new(2.2, with_opacity(PINNED_RING, opacity)),
        );
    }
    if bubble.comparing {
        let mut path = outline_points(style.shape, center, radius + 7.0);
        if let Some(&first) = path.first() {
            path.push(first);
        }
        painter.extend(Shape::dashed_line(
            &path,
            Stroke::new(1.8, with_opacity(COMPARE_RING, opacity)),
            6.0,
            4.0,
        ));
    }

    if radius >= MIN_LABELED_RADIUS {
        paint_label(painter, engine, bubble, center, radius, opacity, style.theme);
    }
}

fn paint_label(
    painter: &Painter,
    engine: &Engine,
    bubble: &Bubble,
    center: Pos2,
    radius: f32,
    opacity: f32,
    theme: Theme,
) {
    let Some(topic) = engine.topic(bubble.topic_index) else {
        return;
    };

    let font = FontId::proportional((radius * 0.26).clamp(9.0, 16.0));
    let secondary_font = FontId::proportional((radius * 0.2).clamp(8.0, 13.0));
    let measure = |text: &str| {
        painter
            .layout_no_wrap(text.to_owned(), font.clone(), Color32::WHITE)
            .size()
            .x
    };
    let lines = wrap_label(&topic.name, radius * 1.5, MAX_LABEL_LINES, measure);

    let line_height = font.size * 1.15;
    let secondary_height = secondary_font.size * 1.2;
    let total = lines.len() as f32 * line_height + secondary_height;
    let mut y = center.y - total * 0.5;

    let text = with_opacity(text_color(theme), opacity);
    for line in lines {
        painter.text(pos2(center.x, y), Align2::CENTER_TOP, line, font.clone(), text);
        y += line_height;
    }

    if let Some(metric) = engine.resolve_metric(bubble.topic_index) {
        let color = match metric.trend {
            Some(percent) => trend_color(percent),
            None => blend_color(text_color(theme), background_color(theme), 0.3),
        };
        painter.text(
            pos2(center.x, y),
            Align2::CENTER_TOP,
            metric.label,
            secondary_font,
            with_opacity(color, opacity),
        );
    }
}

fn fill_shape(painter: &Painter, shape: BubbleShape, center: Pos2, radius: f32, color: Color32) {
    match shape {
        BubbleShape::Circle => {
            painter.circle_filled(center, radius, color);
        }
        BubbleShape::Square | BubbleShape::Hexagon => {
            painter.add(Shape::convex_polygon(
                outline_points(shape, center, radius),
                color,
                Stroke::NONE,
            ));
        }
    }
}

fn outline_shape(painter: &Painter, shape: BubbleShape, center: Pos2, radius: f32, stroke: Stroke) {
    match shape {
        BubbleShape::Circle => {
            painter.circle_stroke(center, radius, stroke);
        }
        BubbleShape::Square | BubbleShape::Hexagon => {
            painter.add(Shape::closed_line(outline_points(shape, center, radius), stroke));
        }
    }
}

/// Vertices of the shape's outline, clockwise from the top.
fn outline_points(shape: BubbleShape, center: Pos2, radius: f32) -> Vec<Pos2> {
    let corners = match shape {
        BubbleShape::Circle => 48,
        BubbleShape::Square => 4,
        BubbleShape::Hexagon => 6,
    };
    // Squares sit flat; circumradius grows so the square spans the bubble's diameter.
    let (start, reach) = match shape {
        BubbleShape::Square => (std::f32::consts::FRAC_PI_4, radius * std::f32::consts::SQRT_2),
        _ => (0.0, radius),
    };

    (0..corners)
        .map(|corner| {
            let angle = start + corner as f32 / corners as f32 * std::f32::consts::TAU;
            center + Vec2::angled(angle - std::f32::consts::FRAC_PI_2) * reach
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_outline_spans_the_diameter() {
        let points = outline_points(BubbleShape::Square, pos2(0.0, 0.0), 10.0);
        assert_eq!(points.len(), 4);
        for point in points {
            assert!((point.x.abs() - 10.0).abs() < 1e-3);
            assert!((point.y.abs() - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn hexagon_vertices_lie_on_the_radius() {
        let center = pos2(50.0, 40.0);
        let points = outline_points(BubbleShape::Hexagon, center, 12.0);
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|point| (point.distance(center) - 12.0).abs() < 1e-3));
        assert!((points[0].y - (center.y - 12.0)).abs() < 1e-3);
    }
}
