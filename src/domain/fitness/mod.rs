// Ranking of configuration totals
pub mod comparator;

use serde::Serialize;
use std::collections::BTreeMap;

/// Frozen fitness of one configuration after `finalize`.
///
/// The total is the plain sum of every metric's time integral. It has no
/// physical meaning; it exists only for relative ranking of configurations
/// scored against the same registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationFitness {
    pub config_id: String,
    pub total_score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl ConfigurationFitness {
    /// JSON rendering of the per-metric breakdown for diagnostics.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
