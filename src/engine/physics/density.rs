use std::f32::consts::PI;

use eframe::egui::Vec2;

use super::super::bubble::Bubble;

/// Largest share of the radius the regulator may take away.
pub const MAX_SHRINK: f32 = 0.45;
/// Shrink per unit of density above the threshold.
const SHRINK_RATE: f32 = 1.4;
pub const HOVER_BOOST: f32 = 1.12;
/// Share of the gap to the target radius closed per frame.
const RADIUS_EASE: f32 = 0.12;

/// Covered fraction of the canvas, measured on base radii so shrinking does
/// not feed back into the measurement.
pub fn canvas_density(bubbles: &[Bubble], canvas: Vec2) -> f32 {
    let canvas_area = canvas.x * canvas.y;
    if canvas_area <= 0.0 {
        return 0.0;
    }
    let covered = bubbles
        .iter()
        .map(|bubble| PI * bubble.base_radius * bubble.base_radius)
        .sum::<f32>();
    covered / canvas_area
}

pub fn shrink_factor(density: f32, threshold: f32) -> f32 {
    if density <= threshold {
        return 1.0;
    }
    (1.0 - (density - threshold) * SHRINK_RATE).clamp(1.0 - MAX_SHRINK, 1.0)
}

/// Moves each displayed radius a fixed share toward `base * shrink`, boosted
/// for the hovered bubble.
pub fn ease_radii(bubbles: &mut [Bubble], shrink: f32, time_step_scale: f32) {
    let ease = (RADIUS_EASE * time_step_scale).min(1.0);
    for bubble in bubbles.iter_mut() {
        let mut target = bubble.base_radius * shrink;
        if bubble.hovered {
            target *= HOVER_BOOST;
        }
        bubble.radius = (bubble.radius + (target - bubble.radius) * ease).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Color32, pos2, vec2};

    use super::*;

    fn bubble(radius: f32) -> Bubble {
        Bubble::new(0, pos2(0.0, 0.0), radius, Color32::WHITE, 0.0, 10.0)
    }

    #[test]
    fn shrink_is_non_increasing_and_bottoms_out() {
        let canvas = vec2(400.0, 300.0);
        let threshold = 0.35;
        let mut bubbles = Vec::new();
        let mut previous = 1.0;
        let mut reached_floor = false;

        for _ in 0..60 {
            bubbles.push(bubble(30.0));
            let factor = shrink_factor(canvas_density(&bubbles, canvas), threshold);
            assert!(factor <= previous);
            assert!(factor >= 1.0 - MAX_SHRINK);
            reached_floor |= (factor - (1.0 - MAX_SHRINK)).abs() < 1e-6;
            previous = factor;
        }
        assert!(reached_floor);
    }

    #[test]
    fn below_threshold_keeps_full_size() {
        assert_eq!(shrink_factor(0.1, 0.35), 1.0);
        assert_eq!(shrink_factor(0.35, 0.35), 1.0);
    }

    #[test]
    fn radii_ease_without_snapping() {
        let mut bubbles = [bubble(40.0)];
        ease_radii(&mut bubbles, 0.5, 1.0);
        let radius = bubbles[0].radius;
        assert!(radius < 40.0 && radius > 20.0);
    }

    #[test]
    fn hover_boost_applies_after_shrink() {
        let mut bubbles = [bubble(40.0)];
        bubbles[0].hovered = true;
        for _ in 0..400 {
            ease_radii(&mut bubbles, 0.5, 1.0);
        }
        assert!((bubbles[0].radius - 40.0 * 0.5 * HOVER_BOOST).abs() < 0.01);
    }
}
