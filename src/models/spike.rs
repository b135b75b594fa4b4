//! Spike annotation models

use chrono::{DateTime, Utc};

/// A price drop reported by the upstream detector
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeEvent {
    pub timestamp: DateTime<Utc>,
    pub price_before: f64,
    pub price_after: f64,
    pub drop_percent: f64,
}
