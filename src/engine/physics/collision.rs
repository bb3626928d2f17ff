use super::super::bubble::Bubble;

/// Share of the closing speed kept after a bounce.
pub const RESTITUTION: f32 = 0.85;

/// Separates every overlapping pair and bounces pairs that are still closing.
/// Returns how many overlaps were corrected.
pub fn resolve_collisions(bubbles: &mut [Bubble]) -> usize {
    let mut resolved = 0;
    let count = bubbles.len();

    for i in 0..count {
        for j in (i + 1)..count {
            let (head, tail) = bubbles.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            let delta = b.pos - a.pos;
            let distance_sq = delta.length_sq();
            let min_distance = a.display_radius() + b.display_radius();
            if distance_sq >= min_distance * min_distance || distance_sq <= f32::EPSILON {
                continue;
            }

            let distance = distance_sq.sqrt();
            let normal = delta / distance;
            let correction = normal * ((min_distance - distance) * 0.5);
            a.pos -= correction;
            b.pos += correction;
            resolved += 1;

            // Positive when a moves toward b faster than b moves away.
            let closing_speed = (a.velocity - b.velocity).dot(normal);
            if closing_speed > 0.0 {
                let impulse = normal * (closing_speed * (1.0 + RESTITUTION) * 0.5);
                a.velocity -= impulse;
                b.velocity += impulse;
            }
        }
    }

    resolved
}
