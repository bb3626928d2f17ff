use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align, Key, Layout, Response, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::engine::{BubbleShape, EngineConfig, LayoutKind, Theme};
use crate::feed::Timeframe;

use super::super::{SearchMatchCache, ViewModel};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
    carry: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Accumulated arrow-key movement for a focused slider, in units of `step`.
/// Holding a key accelerates. Returns `None` while no arrow key is held.
fn slider_key_travel(ui: &Ui, response: &Response, step: f32, whole_steps: bool) -> Option<f32> {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return None;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };

    let direction = (increase_down as i8) - (decrease_down as i8);
    let travel = if direction == 0 {
        hold_state.carry = 0.0;
        None
    } else {
        let hold_secs = if direction > 0 {
            hold_state.positive_secs
        } else {
            hold_state.negative_secs
        };
        let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
        hold_state.carry += direction as f32 * step * speed * delta_time;
        let travel = if whole_steps {
            hold_state.carry.trunc()
        } else {
            hold_state.carry
        };
        hold_state.carry -= travel;
        ui.ctx().request_repaint();
        Some(travel)
    };

    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    travel
}

fn apply_slider_arrow_acceleration_f32(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let Some(travel) = slider_key_travel(ui, response, step, false) else {
        return false;
    };
    let old_value = *value;
    *value = (*value + travel).clamp(min, max);
    (*value - old_value).abs() > f32::EPSILON
}

fn apply_slider_arrow_acceleration_usize(
    ui: &Ui,
    response: &Response,
    value: &mut usize,
    min: usize,
    max: usize,
) -> bool {
    let Some(travel) = slider_key_travel(ui, response, 1.0, true) else {
        return false;
    };
    let old_value = *value;
    *value = (*value as isize + travel as isize).clamp(min as isize, max as isize) as usize;
    *value != old_value
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Topic indices whose names match `query`, best score first.
fn rank_matches(names: impl Iterator<Item = (usize, String)>, query: &str) -> Vec<usize> {
    let matcher = SkimMatcherV2::default();
    let mut scored = names
        .filter_map(|(index, name)| {
            fuzzy_match_score(&matcher, &name, query).map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(index, _)| index).collect()
}

impl ViewModel {
    fn refresh_search_cache(&mut self) {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return;
        }
        if let Some(cached) = &self.search_match_cache
            && cached.topics_revision == self.topics_revision
            && cached.query == query
        {
            return;
        }

        let ranked = rank_matches(
            self.topics
                .iter()
                .enumerate()
                .map(|(index, topic)| (index, topic.name.clone())),
            query,
        );
        let matches = Arc::new(ranked.iter().copied().collect::<HashSet<_>>());
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            topics_revision: self.topics_revision,
            ranked,
            matches,
        });
    }

    /// Topics matching the search box, or `None` while it is empty.
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        self.refresh_search_cache();
        self.search_match_cache
            .as_ref()
            .map(|cache| Arc::clone(&cache.matches))
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Chart Controls");
        ui.separator();
        ui.add_space(4.0);

        let before = self.config.clone();

        ui.label("Search topics")
            .on_hover_text("Fuzzy-highlight matching bubbles; everything else is dimmed.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let capacity_slider = ui
            .add(
                egui::Slider::new(&mut self.config.capacity, 1..=EngineConfig::MAX_CAPACITY)
                    .text("Capacity"),
            )
            .on_hover_text("Maximum number of bubbles on the canvas at once.");
        if capacity_slider.hovered() {
            capacity_slider.request_focus();
        }
        apply_slider_arrow_acceleration_usize(
            ui,
            &capacity_slider,
            &mut self.config.capacity,
            1,
            EngineConfig::MAX_CAPACITY,
        );

        let padding_slider = ui
            .add(
                egui::Slider::new(&mut self.config.padding, 0.0..=48.0)
                    .text("Padding")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Margin kept free along the canvas edges by laid-out bubbles.");
        apply_slider_arrow_acceleration_f32(
            ui,
            &padding_slider,
            &mut self.config.padding,
            0.0,
            48.0,
            0.5,
        );

        let spacing_slider = ui
            .add(
                egui::Slider::new(&mut self.config.min_spacing, 0.0..=24.0)
                    .text("Minimum spacing")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Gap between neighbouring bubbles when sizing and placing them.");
        apply_slider_arrow_acceleration_f32(
            ui,
            &spacing_slider,
            &mut self.config.min_spacing,
            0.0,
            24.0,
            0.25,
        );

        ui.separator();

        egui::ComboBox::from_label("Layout")
            .selected_text(self.config.layout.label())
            .show_ui(ui, |ui| {
                for kind in LayoutKind::ALL {
                    ui.selectable_value(&mut self.config.layout, kind, kind.label());
                }
            });
        egui::ComboBox::from_label("Theme")
            .selected_text(self.config.theme.label())
            .show_ui(ui, |ui| {
                for theme in Theme::ALL {
                    ui.selectable_value(&mut self.config.theme, theme, theme.label());
                }
            });
        egui::ComboBox::from_label("Shape")
            .selected_text(self.config.shape.label())
            .show_ui(ui, |ui| {
                for shape in BubbleShape::ALL {
                    ui.selectable_value(&mut self.config.shape, shape, shape.label());
                }
            });
        egui::ComboBox::from_label("Change window")
            .selected_text(self.config.timeframe.label())
            .show_ui(ui, |ui| {
                for timeframe in Timeframe::ALL {
                    ui.selectable_value(&mut self.config.timeframe, timeframe, timeframe.label());
                }
            })
            .response
            .on_hover_text("Which percent change trending topics show under their name.");

        ui.checkbox(&mut self.config.compact, "Compact device")
            .on_hover_text("Start shrinking free-floating bubbles at a lower canvas density.");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        if self.config != before
            && let Some(chart) = self.chart.as_mut()
        {
            let engine = chart.engine_mut();
            engine.reconfigure(self.config.clone());
            self.config = engine.config().clone();
        }

        ui.separator();
        ui.label("Topics by magnitude");
        self.draw_topic_ranking(ui);
    }

    fn draw_topic_ranking(&mut self, ui: &mut Ui) {
        self.refresh_search_cache();
        let rows = match &self.search_match_cache {
            Some(cache) => cache.ranked.clone(),
            None => (0..self.topics.len()).collect(),
        };
        if rows.is_empty() {
            ui.label("No topics match the search.");
            return;
        }

        let row_count = rows.len().min(self.topic_rows_visible);
        let mut should_load_more = false;
        let mut selected = None;

        egui::ScrollArea::vertical()
            .id_salt("topic_ranking_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                if row_range.end + Self::TOPIC_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for row in row_range {
                    let Some(&topic_index) = rows.get(row) else {
                        continue;
                    };
                    let Some(topic) = self.topics.get(topic_index) else {
                        continue;
                    };

                    let is_selected = self.selected == Some(topic_index);
                    let marker = if self.is_on_canvas(topic_index) { "● " } else { "" };
                    let value_label = topic.metric.resolve(self.config.timeframe).label;

                    let clicked = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(is_selected, format!("{marker}{}", topic.name))
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(value_label);
                            });
                            clicked
                        })
                        .inner;
                    if clicked {
                        selected = Some(topic_index);
                    }
                }
            });

        if selected.is_some() {
            self.selected = selected;
        }
        if should_load_more && row_count < rows.len() {
            self.topic_rows_visible = (row_count + Self::TOPIC_PAGE_ROWS).min(rows.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> impl Iterator<Item = (usize, String)> {
        list.iter()
            .enumerate()
            .map(|(index, name)| (index, (*name).to_owned()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn search_is_case_insensitive_and_skips_misses() {
        let ranked = rank_matches(names(&["Rust", "WebAssembly", "Kubernetes"]), "wasm");
        assert_eq!(ranked, vec![1]);

        let ranked = rank_matches(names(&["Rust", "rustup", "Go"]), "RUST");
        assert!(ranked.contains(&0) && ranked.contains(&1));
        assert!(!ranked.contains(&2));
    }

    #[test]
    fn multiplier_ramps_up_and_caps() {
        assert_eq!(slider_key_accel_multiplier(0.0), 1.0);
        assert!(slider_key_accel_multiplier(0.5) > slider_key_accel_multiplier(0.1));
        assert_eq!(slider_key_accel_multiplier(60.0), SLIDER_KEY_ACCEL_MAX);
    }
}
