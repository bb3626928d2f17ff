mod collision;
mod density;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use rand::rngs::StdRng;

use super::bubble::Bubble;

pub use collision::resolve_collisions;
pub use density::{canvas_density, ease_radii, shrink_factor};

pub const MAX_SPEED: f32 = 1.6;
pub const MIN_DRIFT_SPEED: f32 = 0.12;
pub const VELOCITY_DAMPING: f32 = 0.996;
/// Share of the remaining distance to target covered per frame.
pub const TARGET_PULL: f32 = 0.08;

/// Frame time relative to a 60 Hz frame, clamped so a stalled frame cannot
/// teleport bubbles.
pub fn time_step_scale(delta_seconds: f64) -> f32 {
    ((delta_seconds * 60.0) as f32).clamp(0.25, 3.0)
}

pub fn random_velocity(rng: &mut StdRng) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let speed = rng.gen_range(0.25..0.9) * MAX_SPEED;
    vec2(angle.cos(), angle.sin()) * speed
}

/// Advances free-floating bubbles: damping, speed cap, drift floor,
/// integration, then reflection off the canvas edges.
pub fn integrate_free(bubbles: &mut [Bubble], canvas: Vec2, time_step_scale: f32) {
    let damping = VELOCITY_DAMPING.powf(time_step_scale);

    for bubble in bubbles.iter_mut() {
        let mut velocity = bubble.velocity * damping;
        let speed = velocity.length();
        if speed > MAX_SPEED {
            velocity *= MAX_SPEED / speed;
        } else if speed > f32::EPSILON && speed < MIN_DRIFT_SPEED {
            velocity *= MIN_DRIFT_SPEED / speed;
        }

        bubble.velocity = velocity;
        bubble.pos += velocity * time_step_scale;
        reflect_off_edges(bubble, canvas);
    }
}

fn reflect_off_edges(bubble: &mut Bubble, canvas: Vec2) {
    let radius = bubble.display_radius();

    if canvas.x <= radius * 2.0 {
        bubble.pos.x = canvas.x * 0.5;
    } else if bubble.pos.x - radius < 0.0 {
        bubble.pos.x = radius;
        bubble.velocity.x = bubble.velocity.x.abs();
    } else if bubble.pos.x + radius > canvas.x {
        bubble.pos.x = canvas.x - radius;
        bubble.velocity.x = -bubble.velocity.x.abs();
    }

    if canvas.y <= radius * 2.0 {
        bubble.pos.y = canvas.y * 0.5;
    } else if bubble.pos.y - radius < 0.0 {
        bubble.pos.y = radius;
        bubble.velocity.y = bubble.velocity.y.abs();
    } else if bubble.pos.y + radius > canvas.y {
        bubble.pos.y = canvas.y - radius;
        bubble.velocity.y = -bubble.velocity.y.abs();
    }
}

/// Eases laid-out bubbles toward their targets by a fixed proportion.
pub fn pull_toward_targets(bubbles: &mut [Bubble], time_step_scale: f32) {
    let pull = (TARGET_PULL * time_step_scale).min(1.0);
    for bubble in bubbles.iter_mut() {
        bubble.velocity = Vec2::ZERO;
        bubble.pos += (bubble.target - bubble.pos) * pull;
    }
}
