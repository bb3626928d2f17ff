use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::engine::{EngineConfig, ExpiryReport, FrameLoop};
use crate::feed::{Topic, load_topics, sample_topics};

mod chart;
mod render_utils;
mod ui;

type LoadResult = Result<Vec<Topic>, String>;

pub struct BubbleApp {
    topics_path: Option<PathBuf>,
    config: EngineConfig,
    seed: Option<u64>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    topics: Vec<Topic>,
    topics_revision: u64,
    config: EngineConfig,
    seed: Option<u64>,
    chart: Option<FrameLoop>,
    surface_error: Option<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<usize>,
    expiry: Option<ExpiryReport>,
    host_pinned: HashSet<usize>,
    host_compared: Vec<usize>,
    topic_rows_visible: usize,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    topics_revision: u64,
    /// Matching topics, best score first.
    ranked: Vec<usize>,
    matches: Arc<HashSet<usize>>,
}

impl BubbleApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        topics_path: Option<PathBuf>,
        config: EngineConfig,
        seed: Option<u64>,
    ) -> Self {
        let state = Self::start_load(topics_path.clone());
        Self {
            topics_path,
            config,
            seed,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(topics_path: Option<PathBuf>) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match &topics_path {
                Some(path) => load_topics(path).map_err(|error| format!("{error:#}")),
                None => Ok(sample_topics()),
            };
            if let Err(error) = &result {
                log::warn!("topic feed failed to load: {error}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(topics_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(topics_path),
        }
    }

    fn source_label(&self) -> String {
        self.topics_path
            .as_ref()
            .map_or_else(|| "built-in sample".to_owned(), |path| path.display().to_string())
    }
}

impl eframe::App for BubbleApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let source = self.source_label();

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(topics) => AppState::Ready(Box::new(ViewModel::new(
                            topics,
                            self.config.clone(),
                            self.seed,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading topics...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the topic feed");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.topics_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &source, &mut reload_requested, is_reloading);
                // Keep runtime edits across reloads and retries.
                self.config = model.config.clone();

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.topics_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(topics)) => model.replace_topics(topics),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
