use serde::{Deserialize, Serialize};

use crate::feed::Timeframe;

use super::layout::LayoutKind;

pub const COMPARE_LIMIT: usize = 5;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub const ALL: [Self; 2] = [Self::Dark, Self::Light];

    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    /// Fraction of the canvas bubbles may cover before radii start to shrink.
    pub fn density_threshold(self, compact: bool) -> f32 {
        let base = match self {
            Self::Dark => 0.38,
            Self::Light => 0.32,
        };
        if compact { base * 0.85 } else { base }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BubbleShape {
    #[default]
    Circle,
    Square,
    Hexagon,
}

impl BubbleShape {
    pub const ALL: [Self; 3] = [Self::Circle, Self::Square, Self::Hexagon];

    pub fn label(self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Square => "Square",
            Self::Hexagon => "Hexagon",
        }
    }
}

/// Who owns the pin and compare sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOwnership {
    #[default]
    Engine,
    /// Toggles only emit events; the host pushes its sets back with
    /// `Engine::mirror_selection`.
    Host,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub capacity: usize,
    pub layout: LayoutKind,
    pub theme: Theme,
    pub shape: BubbleShape,
    pub timeframe: Timeframe,
    pub padding: f32,
    pub min_spacing: f32,
    pub compact: bool,
    pub selection: SelectionOwnership,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: 18,
            layout: LayoutKind::Force,
            theme: Theme::Dark,
            shape: BubbleShape::Circle,
            timeframe: Timeframe::Day,
            padding: 16.0,
            min_spacing: 8.0,
            compact: false,
            selection: SelectionOwnership::Engine,
        }
    }
}

impl EngineConfig {
    pub const MAX_CAPACITY: usize = 60;

    pub fn density_threshold(&self) -> f32 {
        self.theme.density_threshold(self.compact)
    }

    /// Parses a settings file; omitted fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_devices_shrink_sooner() {
        assert_eq!(Theme::Dark.density_threshold(false), 0.38);
        assert_eq!(Theme::Light.density_threshold(false), 0.32);
        assert!(Theme::Dark.density_threshold(true) < Theme::Dark.density_threshold(false));
        assert!((Theme::Light.density_threshold(true) - 0.272).abs() < 1e-6);
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "capacity": 9, "layout": "grid", "theme": "light", "selection": "host" }"#,
        )
        .expect("valid settings");
        assert_eq!(config.capacity, 9);
        assert_eq!(config.layout, LayoutKind::Grid);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.selection, SelectionOwnership::Host);
        assert_eq!(config.shape, BubbleShape::Circle);
        assert_eq!(config.padding, EngineConfig::default().padding);
    }

    #[test]
    fn unknown_layout_is_rejected() {
        assert!(EngineConfig::from_json(r#"{ "layout": "spiral" }"#).is_err());
    }
}
