use eframe::egui::Pos2;

use super::bubble::Bubble;
use super::config::{COMPARE_LIMIT, SelectionOwnership};
use super::events::{EngineEvent, Notice};
use super::Engine;

/// How long the compare-limit notice stays up, in seconds.
pub const NOTICE_SECONDS: f64 = 2.5;

/// First bubble in paint order whose rendered circle contains `pointer`.
pub fn hit_test(pointer: Pos2, bubbles: &[Bubble]) -> Option<usize> {
    bubbles.iter().position(|bubble| {
        let radius = bubble.display_radius();
        radius > 0.0 && bubble.pos.distance_sq(pointer) <= radius * radius
    })
}

impl Engine {
    pub fn topic_at(&self, pointer: Pos2) -> Option<usize> {
        hit_test(pointer, self.pool.bubbles()).map(|index| self.pool.bubbles()[index].topic_index)
    }

    /// Updates hover flags from the pointer and returns the hovered topic.
    pub fn sample_pointer(&mut self, pointer: Option<Pos2>) -> Option<usize> {
        let hit = pointer.and_then(|pointer| hit_test(pointer, self.pool.bubbles()));
        for (index, bubble) in self.pool.bubbles_mut().iter_mut().enumerate() {
            bubble.hovered = Some(index) == hit;
        }
        hit.map(|index| self.pool.bubbles()[index].topic_index)
    }

    pub fn click(&mut self, pointer: Pos2) -> Option<usize> {
        let topic_index = self.topic_at(pointer)?;
        self.events.push(EngineEvent::Open { topic_index });
        Some(topic_index)
    }

    /// Requests the opposite pin state for a topic and returns it. Popping
    /// bubbles cannot be pinned.
    pub fn toggle_pin(&mut self, topic_index: usize) -> Option<bool> {
        let pinned = !self.selection.pinned.contains(&topic_index);
        if pinned && self.pool.get(topic_index).is_some_and(Bubble::is_popping) {
            return None;
        }

        if self.config.selection == SelectionOwnership::Engine {
            if pinned {
                self.selection.pinned.insert(topic_index);
            } else {
                self.selection.pinned.remove(&topic_index);
            }
            self.sync_selection_flags();
        }
        self.events.push(EngineEvent::PinToggled {
            topic_index,
            pinned,
        });
        Some(pinned)
    }

    /// Requests the opposite compare state. Adding past the limit is refused
    /// with a transient notice and leaves every bubble untouched.
    pub fn toggle_compare(&mut self, topic_index: usize) -> Option<bool> {
        let comparing = !self.selection.compared.contains(&topic_index);
        if comparing && self.selection.compared.len() >= COMPARE_LIMIT {
            log::debug!("compare set full, rejected topic {topic_index}");
            self.notice = Some(Notice {
                text: format!("You can compare up to {COMPARE_LIMIT} topics at once"),
                expires_at: self.now + NOTICE_SECONDS,
            });
            self.events.push(EngineEvent::CompareRejected);
            return None;
        }

        if self.config.selection == SelectionOwnership::Engine {
            if comparing {
                self.selection.compared.push(topic_index);
            } else {
                self.selection.compared.retain(|&index| index != topic_index);
            }
            self.sync_selection_flags();
        }
        self.events.push(EngineEvent::CompareToggled {
            topic_index,
            comparing,
        });
        Some(comparing)
    }

    /// Adopts pin and compare sets owned by the host. Ignored unless the host
    /// owns selection.
    pub fn mirror_selection(
        &mut self,
        pinned: impl IntoIterator<Item = usize>,
        compared: impl IntoIterator<Item = usize>,
    ) {
        if self.config.selection != SelectionOwnership::Host {
            log::warn!("ignoring mirrored selection while the engine owns pin/compare state");
            return;
        }

        self.selection.pinned = pinned.into_iter().collect();
        self.selection.compared.clear();
        for topic_index in compared {
            if self.selection.compared.len() == COMPARE_LIMIT {
                break;
            }
            if !self.selection.compared.contains(&topic_index) {
                self.selection.compared.push(topic_index);
            }
        }
        self.sync_selection_flags();
    }

    pub(super) fn sync_selection_flags(&mut self) {
        for bubble in self.pool.bubbles_mut() {
            bubble.pinned =
                self.selection.pinned.contains(&bubble.topic_index) && !bubble.is_popping();
            bubble.comparing = self.selection.compared.contains(&bubble.topic_index);
        }
    }
}
