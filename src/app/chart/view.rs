use eframe::egui::{self, Align2, FontId, PointerButton, Sense, Ui, Vec2, vec2};

use crate::engine::{Engine, EngineError, EngineEvent, FrameLoop, SelectionOwnership};

use super::super::ViewModel;
use super::super::render_utils::{blend_color, draw_background, text_color};
use super::paint::{PaintStyle, paint_bubbles};

impl ViewModel {
    /// Attaches a fresh engine to the canvas. Host-owned selection survives
    /// restarts because it lives in the view model.
    fn start_chart(&mut self, surface: Vec2) {
        let mut engine = Engine::new(self.config.clone(), self.seed);
        engine.set_topics(self.topics.clone());

        match FrameLoop::start(engine, Some(surface)) {
            Ok(mut chart) => {
                if self.config.selection == SelectionOwnership::Host {
                    chart.engine_mut().mirror_selection(
                        self.host_pinned.iter().copied(),
                        self.host_compared.iter().copied(),
                    );
                }
                self.chart = Some(chart);
                self.surface_error = None;
            }
            Err(error @ EngineError::SurfaceUnavailable { width, height }) => {
                if self.surface_error.is_none() {
                    log::warn!("chart not started: {error}");
                }
                self.surface_error = Some(format!(
                    "Waiting for a drawing surface ({width:.0}x{height:.0})"
                ));
            }
        }
    }

    pub(in crate::app) fn restart_chart(&mut self) {
        if let Some(mut chart) = self.chart.take() {
            chart.release();
        }
        self.expiry = None;
    }

    pub(in crate::app) fn draw_chart(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.config.theme);

        if self.chart.is_none() {
            self.start_chart(rect.size());
        }
        let matches = self.cached_search_matches();

        let Some(chart) = self.chart.as_mut() else {
            let message = self
                .surface_error
                .as_deref()
                .unwrap_or("Chart is not running");
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(14.0),
                text_color(self.config.theme),
            );
            return;
        };

        let (now, pointer, command) = ui.input(|input| {
            (
                input.time,
                input.pointer.hover_pos(),
                input.modifiers.command,
            )
        });
        let local_pointer = pointer
            .filter(|pointer| rect.contains(*pointer))
            .map(|pointer| (pointer - rect.min).to_pos2());

        let style = PaintStyle {
            origin: rect.min,
            theme: self.config.theme,
            shape: self.config.shape,
            matches: matches.as_deref(),
        };
        let hovered = chart.frame(now, rect.size(), local_pointer, |engine| {
            paint_bubbles(&painter, engine, &style);
        });

        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if let Some(pointer) = local_pointer {
            let engine = chart.engine_mut();
            if response.clicked_by(PointerButton::Primary) {
                if command {
                    if let Some(topic_index) = engine.topic_at(pointer) {
                        engine.toggle_compare(topic_index);
                    }
                } else {
                    engine.click(pointer);
                }
            } else if response.clicked_by(PointerButton::Secondary)
                && let Some(topic_index) = engine.topic_at(pointer)
            {
                engine.toggle_pin(topic_index);
            }
        }

        let engine = chart.engine();
        let ink = text_color(self.config.theme);
        if let Some(topic_index) = hovered
            && let Some(topic) = engine.topic(topic_index)
            && let Some(metric) = engine.resolve_metric(topic_index)
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {}",
                    topic.name,
                    metric.label,
                    topic.category_or_default()
                ),
                FontId::proportional(13.0),
                ink,
            );
        }
        if let Some(notice) = engine.notice() {
            painter.text(
                rect.center_bottom() - vec2(0.0, 24.0),
                Align2::CENTER_BOTTOM,
                notice,
                FontId::proportional(15.0),
                blend_color(ink, egui::Color32::from_rgb(241, 146, 94), 0.6),
            );
        }

        if chart.is_active() {
            ui.ctx().request_repaint();
        }

        self.process_events();
    }

    fn process_events(&mut self) {
        let Some(chart) = self.chart.as_mut() else {
            return;
        };
        let host_owned = self.config.selection == SelectionOwnership::Host;
        let mut mirror = false;

        for event in chart.engine_mut().drain_events() {
            match event {
                EngineEvent::Open { topic_index } => {
                    self.selected = Some(topic_index);
                }
                EngineEvent::PinToggled {
                    topic_index,
                    pinned,
                } if host_owned => {
                    if pinned {
                        self.host_pinned.insert(topic_index);
                    } else {
                        self.host_pinned.remove(&topic_index);
                    }
                    mirror = true;
                }
                EngineEvent::CompareToggled {
                    topic_index,
                    comparing,
                } if host_owned => {
                    if comparing {
                        self.host_compared.push(topic_index);
                    } else {
                        self.host_compared.retain(|&index| index != topic_index);
                    }
                    mirror = true;
                }
                EngineEvent::Expiry(report) => {
                    self.expiry = report;
                }
                EngineEvent::PinToggled { .. }
                | EngineEvent::CompareToggled { .. }
                | EngineEvent::CompareRejected => {}
            }
        }

        if mirror {
            chart.engine_mut().mirror_selection(
                self.host_pinned.iter().copied(),
                self.host_compared.iter().copied(),
            );
        }
    }
}
