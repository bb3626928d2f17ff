use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::topic::{ChangeFigure, Timeframe, Topic, TopicMetric};

/// Reads a JSON array of topics and returns it in rank order.
pub fn load_topics(path: &Path) -> Result<Vec<Topic>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read topic feed {}", path.display()))?;
    let mut topics: Vec<Topic> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid topic feed JSON in {}", path.display()))?;

    if topics.iter().any(|topic| topic.name.trim().is_empty()) {
        bail!("topic feed {} contains a topic without a name", path.display());
    }

    rank_topics(&mut topics);
    log::info!("loaded {} topics from {}", topics.len(), path.display());
    Ok(topics)
}

/// Orders topics by descending magnitude. Ties keep their feed order.
pub fn rank_topics(topics: &mut [Topic]) {
    topics.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));
}

pub fn sample_topics() -> Vec<Topic> {
    const CATEGORIES: [&str; 4] = ["Technology", "Science", "Markets", "Culture"];
    const NAMES: [&str; 28] = [
        "Rust 2024 edition",
        "Solid-state batteries",
        "Open source funding",
        "Quantum error correction",
        "Heat pumps",
        "Chip export rules",
        "Space weather",
        "Small language models",
        "Gene therapy pricing",
        "Ocean heatwaves",
        "Remote work",
        "Vinyl revival",
        "Electric trucks",
        "Fusion milestones",
        "Bond yields",
        "Lithium supply",
        "Retro gaming",
        "Urban cycling",
        "Microplastics",
        "Satellite internet",
        "Index funds",
        "Board game cafes",
        "WebAssembly runtimes",
        "Coral restoration",
        "Housing starts",
        "Indie publishing",
        "Memory-safe languages",
        "Carbon removal",
    ];
    const BASE_TIME: i64 = 1_760_000_000;

    NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let value = 120.0 + ((NAMES.len() - index) as f64).powf(2.1) * 9.0;
            let metric = if index % 3 == 0 {
                let mut changes = BTreeMap::new();
                for (step, timeframe) in Timeframe::ALL.into_iter().enumerate() {
                    let percent = ((index as f64 * 7.3 + step as f64 * 11.0) % 40.0) - 18.0;
                    changes.insert(
                        timeframe,
                        ChangeFigure {
                            percent,
                            display: format!("{percent:+.1}%"),
                        },
                    );
                }
                TopicMetric::Change { value, changes }
            } else {
                TopicMetric::Generic {
                    value,
                    display: None,
                }
            };

            Topic {
                name: (*name).to_owned(),
                metric,
                category: Some(CATEGORIES[index % CATEGORIES.len()].to_owned()),
                created_at: Some(BASE_TIME - (index as i64 * 37 % 29) * 86_400),
                updated_at: None,
                link: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_descending_and_stable() {
        let mut topics = vec![
            Topic::generic("a", 1.0),
            Topic::generic("b", 5.0),
            Topic::generic("c", 1.0),
            Topic::generic("d", 9.0),
        ];
        rank_topics(&mut topics);
        let names = topics.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["d", "b", "a", "c"]);
    }

    #[test]
    fn sample_feed_is_ranked_and_named() {
        let topics = sample_topics();
        assert!(topics.len() > 20);
        assert!(
            topics
                .windows(2)
                .all(|pair| pair[0].magnitude() >= pair[1].magnitude())
        );
        assert!(topics.iter().all(|topic| !topic.name.is_empty()));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_topics(Path::new("/definitely/missing/topics.json"))
            .expect_err("missing file must fail");
        assert!(format!("{error:#}").contains("topics.json"));
    }
}
