use std::collections::HashSet;

use super::bubble::{Bubble, Phase};

/// Live bubbles in paint order, plus the topic indices they display.
#[derive(Default)]
pub struct BubblePool {
    bubbles: Vec<Bubble>,
    displayed: HashSet<usize>,
}

impl BubblePool {
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn displays(&self, topic_index: usize) -> bool {
        self.displayed.contains(&topic_index)
    }

    /// Adds a bubble unless its topic is already displayed.
    pub fn insert(&mut self, bubble: Bubble) -> bool {
        if !self.displayed.insert(bubble.topic_index) {
            return false;
        }
        self.bubbles.push(bubble);
        true
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubbles_mut(&mut self) -> &mut [Bubble] {
        &mut self.bubbles
    }

    pub fn get(&self, topic_index: usize) -> Option<&Bubble> {
        self.bubbles
            .iter()
            .find(|bubble| bubble.topic_index == topic_index)
    }

    pub fn get_mut(&mut self, topic_index: usize) -> Option<&mut Bubble> {
        self.bubbles
            .iter_mut()
            .find(|bubble| bubble.topic_index == topic_index)
    }

    /// Drops bubbles whose pop animation has finished and returns their topics.
    pub fn remove_popped(&mut self) -> Vec<usize> {
        let mut freed = Vec::new();
        self.bubbles.retain(|bubble| {
            let finished = matches!(bubble.phase, Phase::Popping { progress } if progress >= 1.0);
            if finished {
                freed.push(bubble.topic_index);
            }
            !finished
        });
        for topic_index in &freed {
            self.displayed.remove(topic_index);
        }
        freed
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.displayed.clear();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Color32, Pos2};

    use super::*;

    fn bubble(topic_index: usize) -> Bubble {
        Bubble::new(topic_index, Pos2::ZERO, 10.0, Color32::WHITE, 0.0, 5.0)
    }

    #[test]
    fn rejects_duplicate_topics() {
        let mut pool = BubblePool::default();
        assert!(pool.insert(bubble(3)));
        assert!(!pool.insert(bubble(3)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn removes_only_finished_pops_and_frees_topics() {
        let mut pool = BubblePool::default();
        pool.insert(bubble(0));
        pool.insert(bubble(1));
        pool.insert(bubble(2));
        pool.bubbles_mut()[1].phase = Phase::Popping { progress: 1.0 };
        pool.bubbles_mut()[2].phase = Phase::Popping { progress: 0.4 };

        assert_eq!(pool.remove_popped(), vec![1]);
        assert!(!pool.displays(1));
        assert!(pool.displays(2));
        assert_eq!(pool.len(), 2);
    }
}
