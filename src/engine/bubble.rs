use std::f32::consts::PI;

use eframe::egui::{Color32, Pos2, Vec2};

/// Fraction of spawn progress gained per frame.
pub const SPAWN_STEP: f32 = 0.05;
/// Fraction of pop progress gained per frame.
pub const POP_STEP: f32 = 0.07;
/// How far past its radius a popping bubble grows at the end of the pop.
pub const POP_OVERSHOOT: f32 = 0.35;
/// Smallest base radius as a share of the largest.
const MIN_RADIUS_SHARE: f32 = 0.45;
const MAX_BASE_RADIUS: f32 = 110.0;
/// Canvas share a full free-floating pool covers at base size. Sits above
/// every theme's density threshold so the regulator engages once filled.
pub const FREE_FILL_DENSITY: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Spawning { progress: f32 },
    Steady,
    Popping { progress: f32 },
}

#[derive(Clone, Debug)]
pub struct Bubble {
    pub topic_index: usize,
    pub pos: Pos2,
    pub velocity: Vec2,
    /// Eased radius before spawn/pop scaling.
    pub radius: f32,
    pub base_radius: f32,
    pub target: Pos2,
    pub color: Color32,
    /// Seconds; restamped when the spawn animation completes.
    pub created_at: f64,
    pub lifetime: f64,
    pub phase: Phase,
    pub hovered: bool,
    pub pinned: bool,
    pub comparing: bool,
}

impl Bubble {
    pub fn new(
        topic_index: usize,
        pos: Pos2,
        base_radius: f32,
        color: Color32,
        created_at: f64,
        lifetime: f64,
    ) -> Self {
        Self {
            topic_index,
            pos,
            velocity: Vec2::ZERO,
            radius: base_radius,
            base_radius,
            target: pos,
            color,
            created_at,
            lifetime,
            phase: Phase::Spawning { progress: 0.0 },
            hovered: false,
            pinned: false,
            comparing: false,
        }
    }

    pub fn is_popping(&self) -> bool {
        matches!(self.phase, Phase::Popping { .. })
    }

    pub fn is_steady(&self) -> bool {
        self.phase == Phase::Steady
    }

    pub fn expires_at(&self) -> f64 {
        self.created_at + self.lifetime
    }

    /// Radius as painted and hit-tested this frame.
    pub fn display_radius(&self) -> f32 {
        let radius = match self.phase {
            Phase::Spawning { progress } => self.radius * progress.clamp(0.0, 1.0),
            Phase::Steady => self.radius,
            Phase::Popping { progress } => {
                self.radius * (1.0 + POP_OVERSHOOT * progress.clamp(0.0, 1.0))
            }
        };
        radius.max(0.0)
    }

    pub fn opacity(&self) -> f32 {
        match self.phase {
            Phase::Spawning { progress } => progress.clamp(0.0, 1.0),
            Phase::Steady => 1.0,
            Phase::Popping { progress } => 1.0 - progress.clamp(0.0, 1.0),
        }
    }

    /// Elapsed share of the lifetime in `[0, 1]`. Pinned bubbles never age.
    pub fn age_fraction(&self, now: f64) -> f32 {
        if self.pinned || !self.is_steady() || self.lifetime <= 0.0 {
            return 0.0;
        }
        (((now - self.created_at) / self.lifetime) as f32).clamp(0.0, 1.0)
    }
}

/// Normalises `value` into `[0, 1]` over `[min, max]`. A zero-width range uses
/// a denominator of 1.
pub fn normalize(value: f64, min: f64, max: f64) -> f32 {
    let range = max - min;
    let denominator = if range.abs() < f64::EPSILON || !range.is_finite() {
        1.0
    } else {
        range
    };
    ((value - min) / denominator).clamp(0.0, 1.0) as f32
}

/// Largest radius that still fits a near-square grid of `capacity` cells with
/// `min_spacing` between neighbours.
pub fn max_radius_for(canvas: Vec2, capacity: usize, padding: f32, min_spacing: f32) -> f32 {
    let side = (canvas.x.min(canvas.y) - padding * 2.0).max(0.0);
    let columns = (capacity.max(1) as f32).sqrt().ceil();
    let cell = side / columns;
    ((cell - min_spacing) * 0.5).clamp(0.0, MAX_BASE_RADIUS)
}

/// Largest radius for free-floating bubbles, sized by area: `capacity`
/// bubbles of mean size cover [`FREE_FILL_DENSITY`] of the canvas.
pub fn free_max_radius_for(canvas: Vec2, capacity: usize) -> f32 {
    let area = canvas.x.max(0.0) * canvas.y.max(0.0);
    let mean_radius = (FREE_FILL_DENSITY * area / (capacity.max(1) as f32 * PI)).sqrt();
    let mean_share = (1.0 + MIN_RADIUS_SHARE) * 0.5;
    (mean_radius / mean_share).clamp(0.0, MAX_BASE_RADIUS)
}

pub fn base_radius_for(magnitude_norm: f32, max_radius: f32) -> f32 {
    let min_radius = max_radius * MIN_RADIUS_SHARE;
    min_radius + magnitude_norm.clamp(0.0, 1.0) * (max_radius - min_radius)
}
