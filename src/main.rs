mod app;
mod engine;
mod feed;
mod util;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use crate::engine::{BubbleShape, EngineConfig, LayoutKind, SelectionOwnership, Theme};
use crate::feed::Timeframe;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON topic feed; a built-in sample feed is shown when omitted.
    #[arg(long)]
    topics: Option<PathBuf>,
    /// JSON engine settings; flags below override individual fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    capacity: Option<usize>,
    #[arg(long, value_enum)]
    layout: Option<LayoutKind>,
    #[arg(long, value_enum)]
    theme: Option<Theme>,
    #[arg(long, value_enum)]
    shape: Option<BubbleShape>,
    #[arg(long, value_enum)]
    timeframe: Option<Timeframe>,
    /// Fixed RNG seed for reproducible placement and lifetimes.
    #[arg(long)]
    seed: Option<u64>,
    /// Lower the density threshold, as on small screens.
    #[arg(long)]
    compact: bool,
    /// Let the host own pin/compare state and mirror it into the engine.
    #[arg(long)]
    host_selection: bool,
}

impl Args {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings {}", path.display()))?;
                EngineConfig::from_json(&text)
                    .with_context(|| format!("parsing settings {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if let Some(shape) = self.shape {
            config.shape = shape;
        }
        if let Some(timeframe) = self.timeframe {
            config.timeframe = timeframe;
        }
        if self.compact {
            config.compact = true;
        }
        if self.host_selection {
            config.selection = SelectionOwnership::Host;
        }
        Ok(config)
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = match args.engine_config() {
        Ok(config) => config,
        Err(error) => {
            log::error!("{error:#}");
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "topic-bubbles",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::BubbleApp::new(
                cc,
                args.topics.clone(),
                config.clone(),
                args.seed,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "topic-bubbles",
            "--capacity",
            "12",
            "--layout",
            "importance",
            "--theme",
            "light",
            "--compact",
            "--host-selection",
        ]);
        let config = args.engine_config().expect("no settings file");
        assert_eq!(config.capacity, 12);
        assert_eq!(config.layout, LayoutKind::Importance);
        assert_eq!(config.theme, Theme::Light);
        assert!(config.compact);
        assert_eq!(config.selection, SelectionOwnership::Host);
        assert_eq!(config.shape, BubbleShape::Circle);
    }

    #[test]
    fn missing_settings_file_is_reported() {
        let args = Args::parse_from(["topic-bubbles", "--config", "/nonexistent/settings.json"]);
        let error = args.engine_config().expect_err("file does not exist");
        assert!(format!("{error:#}").contains("reading settings"));
    }
}
