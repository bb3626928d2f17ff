mod load;
mod topic;

pub use load::{load_topics, sample_topics};
pub use topic::{ResolvedMetric, Timeframe, Topic};
