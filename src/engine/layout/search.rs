use eframe::egui::{Pos2, pos2, vec2};
use rand::Rng;
use rand::rngs::StdRng;

use super::{LayoutStrategy, Scene, Subject};

const PACKED_ATTEMPTS: usize = 900;
const PACKED_ANGLE_STEP: f32 = 0.32;
const FORCE_ATTEMPTS: usize = 60;

/// Spiral outward from the centre and take the first clear spot.
pub struct PackedLayout;

impl LayoutStrategy for PackedLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let center = usable.center();
        let growth = (scene.average_radius * 0.08).max(0.5);
        let spacing = scene.min_spacing * 0.5;

        let mut candidate = center;
        for attempt in 0..PACKED_ATTEMPTS {
            let angle = attempt as f32 * PACKED_ANGLE_STEP;
            candidate = center + vec2(angle.cos(), angle.sin()) * (growth * angle);

            let inside = usable.shrink(subject.radius).contains(candidate);
            if inside && !scene.overlaps_placed(candidate, subject.radius, spacing) {
                return candidate;
            }
        }

        log::warn!(
            "packed placement for topic {} found no clear spot after {PACKED_ATTEMPTS} attempts",
            subject.topic_index
        );
        candidate
    }
}

/// Random position clear of every live bubble. Placement only happens at
/// spawn; afterwards the bubble moves under its own velocity.
pub struct ForceLayout;

impl LayoutStrategy for ForceLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let radius = subject.radius;
        let mut axis = |min: f32, max: f32| {
            if min + radius >= max - radius {
                (min + max) * 0.5
            } else {
                rng.gen_range((min + radius)..(max - radius))
            }
        };

        let mut candidate = usable.center();
        for _ in 0..FORCE_ATTEMPTS {
            candidate = pos2(
                axis(usable.left(), usable.right()),
                axis(usable.top(), usable.bottom()),
            );
            if !scene.overlaps_placed(candidate, radius, 0.0) {
                return candidate;
            }
        }

        log::warn!(
            "free-floating placement for topic {} overlapped after {FORCE_ATTEMPTS} attempts",
            subject.topic_index
        );
        candidate
    }
}
