use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::format_magnitude;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    #[default]
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeFigure {
    pub percent: f64,
    pub display: String,
}

/// Magnitude of a topic, either a plain weighted value or a value that also
/// carries percentage-change figures per timeframe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopicMetric {
    Generic {
        value: f64,
        #[serde(default)]
        display: Option<String>,
    },
    Change {
        value: f64,
        #[serde(default)]
        changes: BTreeMap<Timeframe, ChangeFigure>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMetric {
    pub magnitude: f64,
    pub label: String,
    /// Signed percent change for the active timeframe, when the topic has one.
    pub trend: Option<f64>,
}

impl TopicMetric {
    pub fn magnitude(&self) -> f64 {
        let value = match self {
            Self::Generic { value, .. } | Self::Change { value, .. } => *value,
        };
        if value.is_finite() { value.max(0.0) } else { 0.0 }
    }

    pub fn resolve(&self, timeframe: Timeframe) -> ResolvedMetric {
        let magnitude = self.magnitude();
        match self {
            Self::Generic { display, .. } => ResolvedMetric {
                magnitude,
                label: display
                    .clone()
                    .unwrap_or_else(|| format_magnitude(magnitude)),
                trend: None,
            },
            Self::Change { changes, .. } => match changes.get(&timeframe) {
                Some(figure) => ResolvedMetric {
                    magnitude,
                    label: figure.display.clone(),
                    trend: Some(figure.percent),
                },
                None => ResolvedMetric {
                    magnitude,
                    label: format_magnitude(magnitude),
                    trend: None,
                },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub metric: TopicMetric,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Topic {
    pub fn generic(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            metric: TopicMetric::Generic {
                value,
                display: None,
            },
            category: None,
            created_at: None,
            updated_at: None,
            link: None,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.metric.magnitude()
    }

    /// Most recent timestamp known for the topic.
    pub fn recency(&self) -> Option<i64> {
        match (self.created_at, self.updated_at) {
            (Some(created), Some(updated)) => Some(created.max(updated)),
            (created, updated) => created.or(updated),
        }
    }

    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("Other")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_metric_resolves_selected_timeframe() {
        let mut changes = BTreeMap::new();
        changes.insert(
            Timeframe::Week,
            ChangeFigure {
                percent: -4.2,
                display: "-4.2%".to_owned(),
            },
        );
        let metric = TopicMetric::Change {
            value: 1500.0,
            changes,
        };

        let week = metric.resolve(Timeframe::Week);
        assert_eq!(week.label, "-4.2%");
        assert_eq!(week.trend, Some(-4.2));

        let day = metric.resolve(Timeframe::Day);
        assert_eq!(day.label, "1.50K");
        assert_eq!(day.trend, None);
        assert_eq!(day.magnitude, 1500.0);
    }

    #[test]
    fn generic_metric_prefers_display_text() {
        let metric = TopicMetric::Generic {
            value: 12.0,
            display: Some("12 mentions".to_owned()),
        };
        assert_eq!(metric.resolve(Timeframe::Month).label, "12 mentions");
    }

    #[test]
    fn negative_or_nan_magnitude_clamps_to_zero() {
        assert_eq!(Topic::generic("a", -3.0).magnitude(), 0.0);
        assert_eq!(Topic::generic("b", f64::NAN).magnitude(), 0.0);
    }

    #[test]
    fn deserializes_tagged_metric() {
        let raw = r#"{
            "name": "Rust",
            "metric": { "kind": "change", "value": 10.0,
                        "changes": { "day": { "percent": 3.5, "display": "+3.5%" } } },
            "category": "Languages"
        }"#;
        let topic: Topic = serde_json::from_str(raw).expect("valid topic");
        assert_eq!(topic.category_or_default(), "Languages");
        assert_eq!(topic.metric.resolve(Timeframe::Day).label, "+3.5%");
    }
}
