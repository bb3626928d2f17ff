use std::time::{SystemTime, UNIX_EPOCH};

use eframe::egui::{self, RichText, Ui};

use crate::engine::COMPARE_LIMIT;
use crate::util::{format_age, format_magnitude};

use super::super::ViewModel;

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Topic Details");
        ui.add_space(6.0);
        self.draw_selected_topic(ui);

        ui.separator();
        self.draw_compare_list(ui);

        ui.separator();
        self.draw_expiry_countdown(ui);
    }

    fn draw_selected_topic(&mut self, ui: &mut Ui) {
        let Some(topic_index) = self.selected else {
            ui.label("Click a bubble or a ranked topic to see its details.");
            return;
        };
        let Some(topic) = self.topics.get(topic_index) else {
            ui.label("Selected topic is no longer in the feed.");
            return;
        };

        let metric = topic.metric.resolve(self.config.timeframe);
        ui.label(RichText::new(topic.name.as_str()).strong());
        ui.small(format!("rank #{}", topic_index + 1));
        ui.add_space(6.0);

        ui.label(format!("Magnitude: {}", format_magnitude(metric.magnitude)));
        if let Some(percent) = metric.trend {
            ui.label(format!(
                "Change ({}): {} ({percent:+.1}%)",
                self.config.timeframe.label(),
                metric.label
            ));
        }
        ui.label(format!("Category: {}", topic.category_or_default()));
        if let Some(recency) = topic.recency() {
            ui.label(format!("Updated: {}", format_age(unix_now() - recency)));
        }
        if let Some(link) = &topic.link {
            ui.hyperlink(link);
        }

        let on_canvas = self.is_on_canvas(topic_index);
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        let engine = chart.engine_mut();
        let pinned = engine.pinned().contains(&topic_index);
        let comparing = engine.compared().contains(&topic_index);

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let pin_label = if pinned { "Unpin" } else { "Pin" };
            if ui
                .add_enabled(on_canvas || pinned, egui::Button::new(pin_label))
                .on_hover_text("Pinned bubbles never expire.")
                .clicked()
            {
                engine.toggle_pin(topic_index);
            }

            let compare_label = if comparing { "Remove from compare" } else { "Compare" };
            if ui.button(compare_label).clicked() {
                engine.toggle_compare(topic_index);
            }
        });
        if !on_canvas {
            ui.small("Not on the canvas right now.");
        }
    }

    fn draw_compare_list(&mut self, ui: &mut Ui) {
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        let engine = chart.engine_mut();
        let compared = engine.compared().to_vec();

        ui.label(RichText::new(format!("Compare ({}/{COMPARE_LIMIT})", compared.len())).strong());
        if compared.is_empty() {
            ui.label("Ctrl/Cmd-click bubbles to compare them side by side.");
            return;
        }

        let mut open = None;
        egui::Grid::new("compare_grid")
            .striped(true)
            .num_columns(3)
            .show(ui, |ui| {
                for topic_index in compared {
                    let Some(topic) = self.topics.get(topic_index) else {
                        continue;
                    };
                    let metric = topic.metric.resolve(self.config.timeframe);
                    if ui.link(topic.name.as_str()).clicked() {
                        open = Some(topic_index);
                    }
                    ui.label(metric.label);
                    if ui.small_button("x").on_hover_text("Remove").clicked() {
                        engine.toggle_compare(topic_index);
                    }
                    ui.end_row();
                }
            });

        if open.is_some() {
            self.selected = open;
        }
    }

    fn draw_expiry_countdown(&self, ui: &mut Ui) {
        ui.label(RichText::new("Next to leave the canvas").strong());
        let Some(chart) = &self.chart else {
            return;
        };
        let engine = chart.engine();

        let Some(report) = self.expiry else {
            if !engine.rotates() {
                ui.label("Every topic fits on the canvas; nothing rotates out.");
            } else {
                ui.label("Waiting for the next expiry report...");
            }
            return;
        };

        let name = self
            .topics
            .get(report.topic_index)
            .map_or("(unknown)", |topic| topic.name.as_str());
        let remaining = (report.expires_at - engine.now()).max(0.0);
        ui.label(name);
        ui.add(
            egui::ProgressBar::new(1.0 - report.progress(engine.now()))
                .text(format!("{remaining:.0}s left of {:.0}s", report.lifetime)),
        );
    }
}
