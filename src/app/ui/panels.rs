use std::collections::{HashSet, VecDeque};

use eframe::egui::{self, Align, Context, Layout};

use crate::engine::EngineConfig;
use crate::feed::Topic;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) const INITIAL_TOPIC_ROWS: usize = 40;
    pub(in crate::app) const TOPIC_PAGE_ROWS: usize = 40;
    pub(in crate::app) const TOPIC_PREFETCH_MARGIN: usize = 4;

    pub(in crate::app) fn new(topics: Vec<Topic>, config: EngineConfig, seed: Option<u64>) -> Self {
        Self {
            topics,
            topics_revision: 0,
            config,
            seed,
            chart: None,
            surface_error: None,
            search: String::new(),
            search_match_cache: None,
            selected: None,
            expiry: None,
            host_pinned: HashSet::new(),
            host_compared: Vec::new(),
            topic_rows_visible: Self::INITIAL_TOPIC_ROWS,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    /// Swaps in a freshly loaded feed without restarting the chart.
    pub(in crate::app) fn replace_topics(&mut self, topics: Vec<Topic>) {
        self.topics = topics;
        self.topics_revision += 1;
        self.search_match_cache = None;
        self.selected = None;
        self.expiry = None;
        self.host_pinned.clear();
        self.host_compared.clear();
        self.topic_rows_visible = Self::INITIAL_TOPIC_ROWS;
        if let Some(chart) = self.chart.as_mut() {
            chart.engine_mut().set_topics(self.topics.clone());
        }
    }

    pub(in crate::app) fn is_on_canvas(&self, topic_index: usize) -> bool {
        self.chart.as_ref().is_some_and(|chart| {
            chart
                .engine()
                .bubbles()
                .iter()
                .any(|bubble| bubble.topic_index == topic_index)
        })
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Topic Bubbles");
                    ui.separator();
                    ui.label(format!("feed: {source}"));
                    ui.label(format!("topics: {}", self.topics.len()));
                    if let Some(chart) = &self.chart {
                        let engine = chart.engine();
                        ui.label(format!("on canvas: {}", engine.bubbles().len()));
                        if engine.rotates() {
                            ui.label(format!(
                                "rotation: cycle {}, next #{}",
                                engine.cursor_wraps() + 1,
                                engine.cursor() + 1
                            ));
                        }
                        if self.config.layout.is_free_floating() && engine.shrink() < 1.0 {
                            ui.label(format!("shrink: {:.0}%", engine.shrink() * 100.0));
                        }
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload topics"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui
                        .button("Restart chart")
                        .on_hover_text("Release the running chart and start a fresh one.")
                        .clicked()
                    {
                        self.restart_chart();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_chart(ui));
    }
}
