/// Soonest upcoming expiry among non-pinned bubbles, for a host countdown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpiryReport {
    pub topic_index: usize,
    pub expires_at: f64,
    pub created_at: f64,
    pub lifetime: f64,
}

impl ExpiryReport {
    /// Elapsed share of the lifetime at `now`, in `[0, 1]`.
    pub fn progress(&self, now: f64) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        (((now - self.created_at) / self.lifetime) as f32).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Open { topic_index: usize },
    PinToggled { topic_index: usize, pinned: bool },
    CompareToggled { topic_index: usize, comparing: bool },
    CompareRejected,
    Expiry(Option<ExpiryReport>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub expires_at: f64,
}
