use std::f32::consts::{FRAC_PI_2, PI, TAU};

use eframe::egui::{Pos2, vec2};
use rand::rngs::StdRng;

use super::{LayoutStrategy, Scene, Subject};

/// Fewest bubbles a circular ring is allowed to hold before another ring is added.
const MIN_RING_DENSITY: f32 = 8.0;
const MAX_RINGS: usize = 4;
/// Bubbles in importance ring `k` (k >= 1).
const IMPORTANCE_RING_GROWTH: usize = 6;

fn on_ring(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    center + vec2(angle.cos(), angle.sin()) * radius
}

/// Members per circular ring. Ring `k` sits at `k + 1` times the innermost
/// radius, so its share of `capacity` grows with its circumference.
fn circular_ring_sizes(capacity: usize, ring_count: usize) -> Vec<usize> {
    let weight_total = (ring_count * (ring_count + 1) / 2) as f32;
    let mut sizes = Vec::with_capacity(ring_count);
    let mut assigned = 0;
    let mut weight = 0.0;
    for ring in 0..ring_count {
        weight += (ring + 1) as f32;
        let cumulative = if ring + 1 == ring_count {
            capacity
        } else {
            (capacity as f32 * weight / weight_total).round() as usize
        };
        let cumulative = cumulative.clamp(assigned, capacity);
        sizes.push(cumulative - assigned);
        assigned = cumulative;
    }
    sizes
}

pub struct CircularLayout;

impl LayoutStrategy for CircularLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let capacity = scene.capacity.max(scene.live_count).max(1);
        if capacity == 1 {
            return usable.center();
        }

        let ring_count = ((capacity as f32 / MIN_RING_DENSITY).ceil() as usize).clamp(1, MAX_RINGS);
        let sizes = circular_ring_sizes(capacity, ring_count);
        let mut ring = ring_count - 1;
        let mut ring_start = capacity - sizes[ring];
        let mut start = 0;
        for (index, &size) in sizes.iter().enumerate() {
            if subject.slot < start + size {
                ring = index;
                ring_start = start;
                break;
            }
            start += size;
        }
        let index_in_ring = subject.slot.saturating_sub(ring_start);
        let items_in_ring = sizes[ring].max(index_in_ring + 1);

        let extent = (usable.width().min(usable.height()) * 0.5 - scene.average_radius).max(0.0);
        let ring_radius = extent * (ring + 1) as f32 / ring_count as f32;
        let step = TAU / items_in_ring as f32;
        let angle = index_in_ring as f32 * step - FRAC_PI_2 + ring as f32 * step * 0.5;
        on_ring(usable.center(), ring_radius, angle)
    }
}

/// Ring index and position within the ring for a magnitude rank. Rank 0 is
/// the centre.
fn importance_ring(rank: usize) -> (usize, usize, usize) {
    if rank == 0 {
        return (0, 0, 1);
    }
    let mut remaining = rank - 1;
    let mut ring = 1;
    loop {
        let size = ring * IMPORTANCE_RING_GROWTH;
        if remaining < size {
            return (ring, remaining, size);
        }
        remaining -= size;
        ring += 1;
    }
}

/// First magnitude rank and slot count of importance ring `ring`.
fn importance_ring_span(ring: usize) -> (usize, usize) {
    if ring == 0 {
        (0, 1)
    } else {
        (1 + IMPORTANCE_RING_GROWTH * ring * (ring - 1) / 2, IMPORTANCE_RING_GROWTH * ring)
    }
}

/// Distance from the centre to importance ring `ring`. Each ring clears the
/// widest bubble of the ring inside it, and is wide enough that its own
/// widest bubbles fit side by side in every slot. Rings with no known radii
/// use the live average.
fn importance_ring_radius(ring: usize, ranked_radii: &[f32], average: f32, spacing: f32) -> f32 {
    let widest = |ring: usize| {
        let (first, slots) = importance_ring_span(ring);
        ranked_radii
            .iter()
            .skip(first)
            .take(slots)
            .copied()
            .reduce(f32::max)
            .unwrap_or(average)
    };

    let mut radius = 0.0;
    for k in 1..=ring {
        let outer = widest(k);
        let clear_inner = radius + widest(k - 1) + outer + spacing;
        let slots = importance_ring_span(k).1 as f32;
        let clear_neighbours = (2.0 * outer + spacing) / (2.0 * (PI / slots).sin());
        radius = clear_inner.max(clear_neighbours);
    }
    radius
}

pub struct ImportanceLayout;

impl LayoutStrategy for ImportanceLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let center = scene.usable_rect().center();
        let (ring, index_in_ring, ring_size) = importance_ring(subject.magnitude_rank);
        if ring == 0 {
            return center;
        }

        let ring_radius = importance_ring_radius(
            ring,
            scene.ranked_radii,
            scene.average_radius,
            scene.min_spacing,
        );
        let angle = TAU * index_in_ring as f32 / ring_size as f32 + ring as f32 * 0.35;
        on_ring(center, ring_radius, angle)
    }
}
