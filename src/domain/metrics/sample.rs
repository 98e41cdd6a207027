use serde::{Deserialize, Serialize};

/// One timestamped raw measurement for a metric.
///
/// Timestamps are simulation-relative seconds and must be non-decreasing per
/// metric; samples for different metrics carry no ordering relative to each
/// other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric_id: String,
    pub timestamp: f64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(metric_id: impl Into<String>, timestamp: f64, value: f64) -> Self {
        Self {
            metric_id: metric_id.into(),
            timestamp,
            value,
        }
    }
}
