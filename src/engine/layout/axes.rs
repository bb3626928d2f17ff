use eframe::egui::{Pos2, Rect, pos2};
use rand::rngs::StdRng;

use super::{LayoutStrategy, Scene, Subject};

/// Larger magnitudes sit higher on the canvas.
fn magnitude_y(area: Rect, radius: f32, magnitude_norm: f32) -> f32 {
    let span = (area.height() - radius * 2.0).max(0.0);
    area.top() + radius + (1.0 - magnitude_norm) * span
}

/// Oldest on the left, evenly spaced by recency rank.
pub struct TimelineLayout;

impl LayoutStrategy for TimelineLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let count = scene.live_count.max(subject.recency_rank + 1);
        let spacing = usable.width() / count as f32;
        pos2(
            usable.left() + spacing * (subject.recency_rank as f32 + 0.5),
            magnitude_y(usable, subject.radius, subject.magnitude_norm),
        )
    }
}

/// Age against magnitude, with no overlap avoidance.
pub struct ScatterLayout;

impl LayoutStrategy for ScatterLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let span = (usable.width() - subject.radius * 2.0).max(0.0);
        pos2(
            usable.left() + subject.radius + subject.recency_norm * span,
            magnitude_y(usable, subject.radius, subject.magnitude_norm),
        )
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use rand::SeedableRng;

    use super::super::test_support::{scene, subject};
    use super::*;

    #[test]
    fn timeline_orders_oldest_left_and_spaces_evenly() {
        let scene = scene(vec2(1000.0, 500.0), 4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let xs = (0..4)
            .map(|rank| {
                let item = Subject {
                    recency_rank: rank,
                    ..subject(3 - rank, 20.0)
                };
                TimelineLayout.place(&item, &scene, &mut rng).x
            })
            .collect::<Vec<_>>();

        let spacing = xs[1] - xs[0];
        assert!(spacing > 0.0);
        assert!((spacing - (1000.0 - 32.0) / 4.0).abs() < 0.01);
        assert!(xs.windows(2).all(|pair| (pair[1] - pair[0] - spacing).abs() < 0.01));
    }

    #[test]
    fn scatter_maps_axes_to_normalised_values() {
        let scene = scene(vec2(500.0, 300.0), 4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let usable = scene.usable_rect();

        let newest_biggest = Subject {
            recency_norm: 1.0,
            magnitude_norm: 1.0,
            ..subject(0, 10.0)
        };
        let target = ScatterLayout.place(&newest_biggest, &scene, &mut rng);
        assert_eq!(target, pos2(usable.right() - 10.0, usable.top() + 10.0));

        let oldest_smallest = Subject {
            recency_norm: 0.0,
            magnitude_norm: 0.0,
            ..subject(1, 10.0)
        };
        let target = ScatterLayout.place(&oldest_smallest, &scene, &mut rng);
        assert_eq!(target, pos2(usable.left() + 10.0, usable.bottom() - 10.0));
    }
}
