//! Bubble simulation: admission and rotation, placement, motion, collision,
//! density shrink and pointer interaction for one chart instance.

mod bubble;
mod config;
mod error;
mod events;
mod frame_loop;
mod interaction;
mod layout;
mod lifecycle;
mod physics;
mod pool;

use std::collections::{HashSet, VecDeque};

use eframe::egui::{Color32, Vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::feed::{ResolvedMetric, Topic};
use crate::util::stable_pair;

pub use bubble::{Bubble, Phase};
pub use config::{BubbleShape, COMPARE_LIMIT, EngineConfig, SelectionOwnership, Theme};
pub use error::EngineError;
pub use events::{EngineEvent, ExpiryReport};
pub use frame_loop::FrameLoop;
pub use layout::LayoutKind;

use layout::{Scene, arrange, build_subjects};
use physics::{
    canvas_density, ease_radii, integrate_free, pull_toward_targets, random_velocity,
    resolve_collisions, shrink_factor, time_step_scale,
};
use events::Notice;
use pool::BubblePool;

const EXPIRY_REPORT_INTERVAL: f64 = 1.0;

const PALETTE: [Color32; 10] = [
    Color32::from_rgb(94, 129, 244),
    Color32::from_rgb(72, 187, 171),
    Color32::from_rgb(240, 146, 72),
    Color32::from_rgb(214, 96, 139),
    Color32::from_rgb(142, 108, 222),
    Color32::from_rgb(96, 178, 96),
    Color32::from_rgb(230, 196, 78),
    Color32::from_rgb(78, 160, 214),
    Color32::from_rgb(206, 110, 84),
    Color32::from_rgb(120, 140, 160),
];

fn topic_color(topic: &Topic) -> Color32 {
    let key = topic.category.as_deref().unwrap_or(&topic.name);
    let (x, y) = stable_pair(key);
    let mix = ((x + 1.0) * 0.5 * 7.0 + (y + 1.0) * 0.5 * 3.0) as usize;
    PALETTE[mix % PALETTE.len()]
}

#[derive(Default)]
struct Selection {
    pinned: HashSet<usize>,
    compared: Vec<usize>,
}

/// One independent chart simulation. Every instance owns its own pool,
/// rotation cursor and RNG stream.
pub struct Engine {
    config: EngineConfig,
    topics: Vec<Topic>,
    magnitude_range: (f64, f64),
    pool: BubblePool,
    pending: VecDeque<usize>,
    next_admit_at: f64,
    cursor: usize,
    cursor_wraps: usize,
    rng: StdRng,
    canvas: Vec2,
    now: f64,
    last_step: Option<f64>,
    layout_dirty: bool,
    shrink: f32,
    selection: Selection,
    notice: Option<Notice>,
    events: Vec<EngineEvent>,
    next_report_at: f64,
}

impl Engine {
    pub fn new(config: EngineConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config: Self::sanitize(config),
            topics: Vec::new(),
            magnitude_range: (0.0, 0.0),
            pool: BubblePool::default(),
            pending: VecDeque::new(),
            next_admit_at: 0.0,
            cursor: 0,
            cursor_wraps: 0,
            rng,
            canvas: Vec2::ZERO,
            now: 0.0,
            last_step: None,
            layout_dirty: true,
            shrink: 1.0,
            selection: Selection::default(),
            notice: None,
            events: Vec::new(),
            next_report_at: 0.0,
        }
    }

    fn sanitize(mut config: EngineConfig) -> EngineConfig {
        config.capacity = config.capacity.clamp(1, EngineConfig::MAX_CAPACITY);
        config.padding = config.padding.max(0.0);
        config.min_spacing = config.min_spacing.max(0.0);
        config
    }

    /// Replaces the ranked topic list and restarts the display from rank 0.
    pub fn set_topics(&mut self, topics: Vec<Topic>) {
        self.magnitude_range = topics.iter().map(Topic::magnitude).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(low, high), value| (low.min(value), high.max(value)),
        );
        if self.magnitude_range.0 > self.magnitude_range.1 {
            self.magnitude_range = (0.0, 0.0);
        }

        self.topics = topics;
        self.pool.clear();
        self.pending.clear();
        self.next_admit_at = self.now;
        self.cursor = 0;
        self.cursor_wraps = 0;
        self.selection = Selection::default();
        self.layout_dirty = true;
        log::info!(
            "engine received {} topics (capacity {})",
            self.topics.len(),
            self.config.capacity
        );
    }

    pub fn reconfigure(&mut self, config: EngineConfig) {
        let config = Self::sanitize(config);
        if config == self.config {
            return;
        }

        let entering_free =
            config.layout.is_free_floating() && !self.config.layout.is_free_floating();
        let resized = config.layout.is_free_floating() != self.config.layout.is_free_floating()
            || config.capacity != self.config.capacity
            || config.padding != self.config.padding
            || config.min_spacing != self.config.min_spacing;
        if entering_free {
            for bubble in self.pool.bubbles_mut() {
                bubble.velocity = random_velocity(&mut self.rng);
            }
        }
        if config.selection != self.config.selection {
            self.selection = Selection::default();
        }

        log::info!(
            "engine reconfigured: layout {:?}, capacity {}, theme {:?}",
            config.layout,
            config.capacity,
            config.theme
        );
        self.config = config;
        if resized {
            self.resize_bases();
        }
        self.layout_dirty = true;
        self.sync_selection_flags();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topic(&self, topic_index: usize) -> Option<&Topic> {
        self.topics.get(topic_index)
    }

    pub fn resolve_metric(&self, topic_index: usize) -> Option<ResolvedMetric> {
        self.topics
            .get(topic_index)
            .map(|topic| topic.metric.resolve(self.config.timeframe))
    }

    /// Live bubbles in paint order.
    pub fn bubbles(&self) -> &[Bubble] {
        self.pool.bubbles()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn shrink(&self) -> f32 {
        self.shrink
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|notice| notice.text.as_str())
    }

    pub fn pinned(&self) -> &HashSet<usize> {
        &self.selection.pinned
    }

    pub fn compared(&self) -> &[usize] {
        &self.selection.compared
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Simulation part of a frame: lifecycle, then layout or free motion,
    /// then collisions, then density easing. Painting and pointer sampling
    /// follow in that order; see [`FrameLoop::frame`].
    pub fn step(&mut self, now: f64, canvas: Vec2) {
        let delta = self.last_step.map_or(1.0 / 60.0, |last| (now - last).max(0.0));
        let scale = time_step_scale(delta);
        self.last_step = Some(now);
        self.now = now;

        if canvas != self.canvas {
            self.canvas = canvas;
            self.resize_bases();
            self.layout_dirty = true;
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|notice| now >= notice.expires_at)
        {
            self.notice = None;
        }

        if self.topics.is_empty() {
            return;
        }

        self.run_lifecycle(now);

        let free = self.config.layout.is_free_floating();
        if free {
            integrate_free(self.pool.bubbles_mut(), self.canvas, scale);
            resolve_collisions(self.pool.bubbles_mut());
        } else {
            if self.layout_dirty {
                self.update_targets();
            }
            pull_toward_targets(self.pool.bubbles_mut(), scale);
        }

        self.shrink = if free {
            shrink_factor(
                canvas_density(self.pool.bubbles(), self.canvas),
                self.config.density_threshold(),
            )
        } else {
            1.0
        };
        ease_radii(self.pool.bubbles_mut(), self.shrink, scale);

        self.report_expiry(now);
    }

    fn update_targets(&mut self) {
        let (subjects, cluster_count) = build_subjects(self.pool.bubbles(), &self.topics);
        let average_radius = if subjects.is_empty() {
            0.0
        } else {
            subjects.iter().map(|subject| subject.radius).sum::<f32>() / subjects.len() as f32
        };
        let mut ranked_radii = vec![0.0; subjects.len()];
        for subject in &subjects {
            if let Some(radius) = ranked_radii.get_mut(subject.magnitude_rank) {
                *radius = subject.radius;
            }
        }
        let scene = Scene {
            canvas: self.canvas,
            padding: self.config.padding,
            min_spacing: self.config.min_spacing,
            capacity: self.config.capacity.min(self.topics.len()),
            live_count: subjects.len(),
            cluster_count,
            average_radius,
            ranked_radii: &ranked_radii,
            placed: &[],
        };

        let targets = arrange(self.config.layout, &subjects, scene, &mut self.rng);
        for (bubble, target) in self.pool.bubbles_mut().iter_mut().zip(targets) {
            bubble.target = target;
            if bubble.phase == (Phase::Spawning { progress: 0.0 }) {
                bubble.pos = target;
            }
        }
        self.layout_dirty = false;
    }

    fn report_expiry(&mut self, now: f64) {
        if now < self.next_report_at {
            return;
        }
        self.next_report_at = now + EXPIRY_REPORT_INTERVAL;
        self.events.push(EngineEvent::Expiry(self.soonest_expiry()));
    }

    pub fn soonest_expiry(&self) -> Option<ExpiryReport> {
        if !self.rotates() || self.pool.is_empty() {
            return None;
        }
        self.pool
            .bubbles()
            .iter()
            .filter(|bubble| bubble.is_steady() && !bubble.pinned)
            .min_by(|a, b| a.expires_at().total_cmp(&b.expires_at()))
            .map(|bubble| ExpiryReport {
                topic_index: bubble.topic_index,
                expires_at: bubble.expires_at(),
                created_at: bubble.created_at,
                lifetime: bubble.lifetime,
            })
    }

    /// Bubbles only expire while undisplayed topics are waiting.
    pub fn rotates(&self) -> bool {
        self.topics.len() > self.config.capacity
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Vec2, vec2};

    use super::*;

    pub(super) fn topics(count: usize) -> Vec<Topic> {
        (0..count)
            .map(|index| Topic::generic(format!("topic {index}"), 1000.0 - index as f64 * 10.0))
            .collect()
    }

    pub(super) fn engine(layout: LayoutKind, capacity: usize, topic_count: usize) -> Engine {
        let config = EngineConfig {
            layout,
            capacity,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config, Some(7));
        engine.set_topics(topics(topic_count));
        engine
    }

    pub(super) fn run(engine: &mut Engine, from: f64, frames: usize) -> f64 {
        let mut now = from;
        for _ in 0..frames {
            now += 1.0 / 60.0;
            engine.step(now, vec2(900.0, 700.0));
        }
        now
    }

    fn assert_invariants(engine: &Engine) {
        let mut seen = HashSet::new();
        for bubble in engine.bubbles() {
            assert!(seen.insert(bubble.topic_index), "duplicate topic");
            assert!(bubble.radius >= 0.0);
            assert!(!(bubble.pinned && bubble.is_popping()));
        }
        assert!(engine.compared().len() <= COMPARE_LIMIT);
        assert!(engine.bubbles().iter().filter(|b| b.hovered).count() <= 1);
    }

    #[test]
    fn empty_topic_list_stays_idle() {
        let mut engine = engine(LayoutKind::Force, 10, 0);
        run(&mut engine, 0.0, 30);
        assert!(engine.bubbles().is_empty());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn invariants_hold_while_rotating_in_every_layout() {
        for layout in LayoutKind::ALL {
            let mut engine = engine(layout, 6, 15);
            let mut now = 0.0;
            for _ in 0..40 {
                now = run(&mut engine, now, 60);
                assert_invariants(&engine);
            }
        }
    }

    #[test]
    fn laid_out_targets_stay_inside_padding() {
        for layout in LayoutKind::ALL {
            if layout.is_free_floating() {
                continue;
            }
            let mut engine = engine(layout, 12, 12);
            run(&mut engine, 0.0, 5);
            for bubble in engine.bubbles() {
                assert!(bubble.target.x >= 16.0 && bubble.target.x <= 900.0 - 16.0);
                assert!(bubble.target.y >= 16.0 && bubble.target.y <= 700.0 - 16.0);
            }
        }
    }

    #[test]
    fn density_shrink_only_applies_to_free_floating() {
        let mut engine = engine(LayoutKind::Grid, 40, 40);
        run(&mut engine, 0.0, 5);
        assert_eq!(engine.shrink(), 1.0);
    }

    #[test]
    fn expiry_reports_are_periodic() {
        let mut engine = engine(LayoutKind::Grid, 3, 8);
        run(&mut engine, 0.0, 150);
        let reports = engine
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Expiry(report) => Some(report),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(reports.len(), 3);
        assert!(reports.last().is_some_and(Option::is_some));
    }

    #[test]
    fn importance_layout_keeps_default_pool_apart() {
        let mut engine = engine(LayoutKind::Importance, 18, 18);
        run(&mut engine, 0.0, 300);
        let bubbles = engine.bubbles();
        assert_eq!(bubbles.len(), 18);

        for (index, a) in bubbles.iter().enumerate() {
            for b in &bubbles[index + 1..] {
                let target_overlap = a.base_radius + b.base_radius - a.target.distance(b.target);
                assert!(
                    target_overlap <= 1.0,
                    "topics {} & {} targets overlap {target_overlap:.1}",
                    a.topic_index,
                    b.topic_index
                );
                let shown_overlap = a.display_radius() + b.display_radius() - a.pos.distance(b.pos);
                assert!(
                    shown_overlap <= 1.0,
                    "topics {} & {} overlap {shown_overlap:.1}",
                    a.topic_index,
                    b.topic_index
                );
            }
        }
    }

    #[test]
    fn full_free_floating_pool_engages_density_shrink() {
        let mut engine = engine(LayoutKind::Force, 40, 40);
        run(&mut engine, 0.0, 60 * 8);
        assert_eq!(engine.bubbles().len(), 40);
        assert!(engine.shrink() < 1.0, "shrink {}", engine.shrink());
    }

    #[test]
    fn entering_free_floating_sets_velocities_and_resizes() {
        let mut engine = engine(LayoutKind::Grid, 18, 18);
        let now = run(&mut engine, 0.0, 30);
        assert!(engine.bubbles().iter().all(|bubble| bubble.velocity == Vec2::ZERO));
        let grid_radius = engine.bubbles()[0].base_radius;

        engine.reconfigure(EngineConfig {
            layout: LayoutKind::Force,
            ..engine.config().clone()
        });
        for bubble in engine.bubbles() {
            let speed = bubble.velocity.length();
            assert!(speed > 0.0 && speed <= physics::MAX_SPEED);
        }
        assert!(engine.bubbles()[0].base_radius > grid_radius);

        run(&mut engine, now, 1);
        assert!(engine.bubbles().iter().all(|bubble| bubble.velocity != Vec2::ZERO));
    }

    #[test]
    fn layout_switch_mid_fill_trims_queue_then_backfills() {
        let mut engine = engine(LayoutKind::Force, 10, 20);
        let mut now = run(&mut engine, 0.0, 1);
        assert_eq!(engine.bubbles().len(), 1);
        assert_eq!(engine.pending.len(), 9);

        engine.reconfigure(EngineConfig {
            layout: LayoutKind::Grid,
            capacity: 6,
            ..engine.config().clone()
        });
        now = run(&mut engine, now, 1);
        assert!(engine.pending.is_empty());
        let shown = engine
            .bubbles()
            .iter()
            .map(|bubble| bubble.topic_index)
            .collect::<HashSet<_>>();
        assert_eq!(shown, (0..6).collect());
        assert_invariants(&engine);

        engine.reconfigure(EngineConfig {
            layout: LayoutKind::Force,
            capacity: 9,
            ..engine.config().clone()
        });
        now = run(&mut engine, now, 1);
        assert_eq!(engine.bubbles().len() + engine.pending.len(), 9);
        assert!(engine.bubbles().len() < 9, "free-floating backfill is staggered");

        run(&mut engine, now, 60);
        assert_eq!(engine.bubbles().len(), 9);
        assert!(engine.pending.is_empty());
        assert_invariants(&engine);
    }

    #[test]
    fn separate_instances_do_not_share_state() {
        let mut first = engine(LayoutKind::Grid, 4, 10);
        let second = engine(LayoutKind::Grid, 4, 10);
        run(&mut first, 0.0, 10);
        assert_eq!(first.bubbles().len(), 4);
        assert!(second.bubbles().is_empty());
    }
}
