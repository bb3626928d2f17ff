use rand::Rng;

use crate::feed::Topic;

use super::bubble::{
    Bubble, POP_STEP, Phase, SPAWN_STEP, base_radius_for, free_max_radius_for, max_radius_for,
    normalize,
};
use super::layout::{Circle, ForceLayout, LayoutStrategy, Scene, Subject};
use super::physics::random_velocity;
use super::{Engine, topic_color};

/// Possible bubble lifetimes in seconds; one is drawn per bubble.
pub const LIFETIME_CHOICES: [f64; 4] = [12.0, 18.0, 24.0, 30.0];
/// Seconds between admissions during a staggered fill.
pub const STAGGER_INTERVAL: f64 = 0.12;

impl Engine {
    /// Bubbles the pool should hold once fill-in completes.
    pub(super) fn target_count(&self) -> usize {
        self.config.capacity.min(self.topics.len())
    }

    /// Slots taken by live bubbles, including popping ones, plus queued admissions.
    fn occupied(&self) -> usize {
        self.pool.len() + self.pending.len()
    }

    fn is_reserved(&self, topic_index: usize) -> bool {
        self.pool.displays(topic_index) || self.pending.contains(&topic_index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_wraps(&self) -> usize {
        self.cursor_wraps
    }

    /// Next topic in cyclic rank order that is neither displayed nor queued.
    pub(super) fn next_from_cursor(&mut self) -> Option<usize> {
        let len = self.topics.len();
        for _ in 0..len {
            let candidate = self.cursor % len;
            self.cursor = candidate + 1;
            if self.cursor >= len {
                self.cursor = 0;
                self.cursor_wraps += 1;
                log::debug!("rotation cursor wrapped ({} wraps)", self.cursor_wraps);
            }
            if !self.is_reserved(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    pub(super) fn run_lifecycle(&mut self, now: f64) {
        self.advance_phases(now);

        for topic_index in self.pool.remove_popped() {
            self.layout_dirty = true;
            if self.occupied() < self.target_count()
                && let Some(next) = self.next_from_cursor()
            {
                log::debug!("topic {topic_index} popped, replaced by topic {next}");
                self.admit(next, now);
            }
        }

        self.expire(now);
        self.trim_excess();
        self.top_up(now);
        self.admit_pending(now);
    }

    fn advance_phases(&mut self, now: f64) {
        for bubble in self.pool.bubbles_mut() {
            bubble.phase = match bubble.phase {
                Phase::Spawning { progress } => {
                    let progress = progress + SPAWN_STEP;
                    if progress >= 0.999 {
                        bubble.created_at = now;
                        Phase::Steady
                    } else {
                        Phase::Spawning { progress }
                    }
                }
                Phase::Popping { progress } => Phase::Popping {
                    progress: (progress + POP_STEP).min(1.0),
                },
                Phase::Steady => Phase::Steady,
            };
        }
    }

    fn expire(&mut self, now: f64) {
        if !self.rotates() {
            return;
        }
        for bubble in self.pool.bubbles_mut() {
            if bubble.is_steady() && !bubble.pinned && now - bubble.created_at >= bubble.lifetime {
                bubble.phase = Phase::Popping { progress: 0.0 };
            }
        }
    }

    /// Pops the lowest-ranked unpinned bubbles when the pool outgrows its target.
    fn trim_excess(&mut self) {
        let target = self.target_count();
        while self.pending.len() + self.active_count() > target && self.pending.pop_back().is_some() {}

        let mut excess = self.active_count().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut candidates = self
            .pool
            .bubbles()
            .iter()
            .filter(|bubble| !bubble.is_popping() && !bubble.pinned)
            .map(|bubble| bubble.topic_index)
            .collect::<Vec<_>>();
        candidates.sort_unstable_by(|a, b| b.cmp(a));

        for topic_index in candidates {
            if excess == 0 {
                break;
            }
            if let Some(bubble) = self.pool.get_mut(topic_index) {
                bubble.phase = Phase::Popping { progress: 0.0 };
                excess -= 1;
            }
        }
    }

    fn active_count(&self) -> usize {
        self.pool
            .bubbles()
            .iter()
            .filter(|bubble| !bubble.is_popping())
            .count()
    }

    /// Fills empty slots with undisplayed topics. Free-floating layouts queue
    /// them for staggered admission.
    fn top_up(&mut self, now: f64) {
        while self.occupied() < self.target_count() {
            let Some(next) = self.next_from_cursor() else {
                break;
            };
            if self.config.layout.staggers_fill() {
                self.pending.push_back(next);
            } else {
                self.admit(next, now);
            }
        }
    }

    fn admit_pending(&mut self, now: f64) {
        if !self.config.layout.staggers_fill() {
            while let Some(topic_index) = self.pending.pop_front() {
                self.admit(topic_index, now);
            }
            return;
        }

        if now < self.next_admit_at {
            return;
        }
        if let Some(topic_index) = self.pending.pop_front() {
            self.admit(topic_index, now);
            self.next_admit_at = now + STAGGER_INTERVAL;
        }
    }

    /// Free-floating bubbles are sized by canvas area and left to the density
    /// regulator; laid-out bubbles are sized to fit a grid cell.
    fn max_base_radius(&self) -> f32 {
        if self.config.layout.is_free_floating() {
            free_max_radius_for(self.canvas, self.config.capacity)
        } else {
            max_radius_for(
                self.canvas,
                self.config.capacity,
                self.config.padding,
                self.config.min_spacing,
            )
        }
    }

    fn base_radius_of(&self, topic: &Topic) -> f32 {
        let (min, max) = self.magnitude_range;
        base_radius_for(normalize(topic.magnitude(), min, max), self.max_base_radius())
    }

    /// Recomputes base radii after a sizing input changed. Displayed radii
    /// ease toward the new values.
    pub(super) fn resize_bases(&mut self) {
        let max_radius = self.max_base_radius();
        let (min, max) = self.magnitude_range;
        for bubble in self.pool.bubbles_mut() {
            if let Some(topic) = self.topics.get(bubble.topic_index) {
                bubble.base_radius =
                    base_radius_for(normalize(topic.magnitude(), min, max), max_radius);
            }
        }
    }

    fn admit(&mut self, topic_index: usize, now: f64) {
        let Some(topic) = self.topics.get(topic_index) else {
            return;
        };
        if self.pool.displays(topic_index) {
            return;
        }

        let base_radius = self.base_radius_of(topic);
        let color = topic_color(topic);
        let lifetime = LIFETIME_CHOICES[self.rng.gen_range(0..LIFETIME_CHOICES.len())];

        let free = self.config.layout.is_free_floating();
        let position = if free {
            let placed = self
                .pool
                .bubbles()
                .iter()
                .map(|bubble| Circle {
                    center: bubble.pos,
                    radius: bubble.base_radius,
                })
                .collect::<Vec<_>>();
            let scene = Scene {
                canvas: self.canvas,
                padding: self.config.padding,
                min_spacing: self.config.min_spacing,
                capacity: self.config.capacity,
                live_count: placed.len(),
                cluster_count: 1,
                average_radius: base_radius,
                ranked_radii: &[],
                placed: &placed,
            };
            let subject = Subject {
                topic_index,
                radius: base_radius,
                ..Subject::default()
            };
            ForceLayout.place(&subject, &scene, &mut self.rng)
        } else {
            (self.canvas * 0.5).to_pos2()
        };

        let mut bubble = Bubble::new(topic_index, position, base_radius, color, now, lifetime);
        if free {
            bubble.velocity = random_velocity(&mut self.rng);
        }
        bubble.pinned = self.selection.pinned.contains(&topic_index);
        bubble.comparing = self.selection.compared.contains(&topic_index);

        if self.pool.insert(bubble) {
            self.layout_dirty = true;
            log::debug!("admitted topic {topic_index} (radius {base_radius:.1}, lifetime {lifetime}s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::super::LayoutKind;
    use super::super::tests::{engine, run};
    use super::*;

    fn force_oldest_pop(engine: &mut Engine) -> usize {
        let bubble = &mut engine.pool.bubbles_mut()[0];
        bubble.phase = Phase::Popping { progress: 1.0 };
        bubble.topic_index
    }

    fn displayed(engine: &Engine) -> HashSet<usize> {
        engine.bubbles().iter().map(|bubble| bubble.topic_index).collect()
    }

    #[test]
    fn staggered_fill_reaches_capacity_and_never_expires() {
        let mut engine = engine(LayoutKind::Force, 10, 10);

        run(&mut engine, 0.0, 1);
        assert_eq!(engine.bubbles().len(), 1);

        let now = run(&mut engine, 1.0 / 60.0, 120);
        assert_eq!(engine.bubbles().len(), 10);

        // Well past every possible lifetime.
        run(&mut engine, now, 60 * 40);
        assert_eq!(engine.bubbles().len(), 10);
        assert!(engine.bubbles().iter().all(|bubble| !bubble.is_popping()));
    }

    #[test]
    fn static_layouts_fill_immediately() {
        let mut engine = engine(LayoutKind::Grid, 9, 9);
        run(&mut engine, 0.0, 1);
        assert_eq!(engine.bubbles().len(), 9);
    }

    #[test]
    fn each_pop_is_replaced_by_the_next_unseen_topic() {
        let mut engine = engine(LayoutKind::Grid, 5, 20);
        let mut now = run(&mut engine, 0.0, 1);
        assert_eq!(displayed(&engine), (0..5).collect());
        assert_eq!(engine.cursor(), 5);

        let wraps_before = engine.cursor_wraps();
        let mut shown = Vec::new();
        for _ in 0..20 {
            let popped = force_oldest_pop(&mut engine);
            let before = displayed(&engine);
            now = run(&mut engine, now, 1);
            let after = displayed(&engine);

            assert_eq!(after.len(), 5);
            assert!(!after.contains(&popped));
            let added = after.difference(&before).copied().collect::<Vec<_>>();
            assert_eq!(added.len(), 1, "exactly one replacement per pop");
            shown.push(added[0]);
        }

        let expected = (5..20).chain(0..5).collect::<Vec<_>>();
        assert_eq!(shown, expected);
        assert_eq!(engine.cursor_wraps() - wraps_before, 1);
        assert_eq!(engine.cursor(), 5);
    }

    #[test]
    fn pinned_bubble_outlives_its_lifetime_until_unpinned() {
        let mut engine = engine(LayoutKind::Grid, 3, 6);
        let mut now = run(&mut engine, 0.0, 30);
        let topic = engine.bubbles()[0].topic_index;
        engine.toggle_pin(topic);

        now = run(&mut engine, now, 60 * 35);
        let bubble = engine.pool.get(topic).expect("pinned bubble stays live");
        assert!(!bubble.is_popping());
        assert!(now - bubble.created_at > bubble.lifetime);

        engine.toggle_pin(topic);
        run(&mut engine, now, 1);
        assert!(engine.pool.get(topic).is_some_and(Bubble::is_popping));
    }

    #[test]
    fn lowering_capacity_pops_lowest_ranked_first() {
        let mut engine = engine(LayoutKind::Grid, 6, 6);
        let now = run(&mut engine, 0.0, 30);
        let config = super::super::EngineConfig {
            capacity: 4,
            ..engine.config().clone()
        };
        engine.reconfigure(config);
        run(&mut engine, now, 40);
        assert_eq!(displayed(&engine), (0..4).collect());
    }

    #[test]
    fn raising_capacity_backfills_without_duplicates() {
        let mut engine = engine(LayoutKind::Circular, 3, 8);
        let now = run(&mut engine, 0.0, 5);
        let config = super::super::EngineConfig {
            capacity: 7,
            ..engine.config().clone()
        };
        engine.reconfigure(config);
        run(&mut engine, now, 1);
        assert_eq!(engine.bubbles().len(), 7);
        assert_eq!(displayed(&engine).len(), 7);
    }

    #[test]
    fn spawn_completion_restamps_creation_time() {
        let mut engine = engine(LayoutKind::Grid, 1, 1);
        let now = run(&mut engine, 0.0, 30);
        let bubble = &engine.bubbles()[0];
        assert!(bubble.is_steady());
        assert!(bubble.created_at > 0.2 && bubble.created_at <= now);
    }
}
