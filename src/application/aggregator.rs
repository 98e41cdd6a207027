use crate::application::evaluator::ConfigurationEvaluator;
use crate::domain::errors::IngestError;
use crate::domain::fitness::comparator::{self, RankedConfiguration};
use crate::domain::fitness::ConfigurationFitness;
use crate::domain::metrics::registry::MetricRegistry;
use crate::domain::metrics::sample::MetricSample;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Owns one evaluator per configuration and the frozen results.
///
/// `total` and `breakdown` are live reads: before `finalize` they reflect
/// whatever partial integrals exist at that instant, afterwards the frozen
/// values. All writes to a single metric remain serialized through its
/// evaluator.
pub struct FitnessAggregator {
    registry: Arc<MetricRegistry>,
    evaluators: RwLock<HashMap<String, Arc<ConfigurationEvaluator>>>,
    results: RwLock<HashMap<String, ConfigurationFitness>>,
}

impl FitnessAggregator {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registry,
            evaluators: RwLock::new(HashMap::new()),
            results: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Begin tracking a configuration, returning its evaluator.
    ///
    /// Starting an id that already exists returns the existing evaluator
    /// unchanged, so a transport reconnect cannot wipe accumulated state.
    pub fn start_configuration(&self, config_id: &str) -> Arc<ConfigurationEvaluator> {
        let mut evaluators = self
            .evaluators
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(evaluators.entry(config_id.to_string()).or_insert_with(|| {
            debug!(config_id, "configuration evaluation started");
            Arc::new(ConfigurationEvaluator::new(
                config_id,
                Arc::clone(&self.registry),
            ))
        }))
    }

    pub fn evaluator(&self, config_id: &str) -> Option<Arc<ConfigurationEvaluator>> {
        self.evaluators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config_id)
            .cloned()
    }

    /// Route one sample into a configuration's evaluator.
    pub fn ingest(&self, config_id: &str, sample: &MetricSample) -> Result<f64, IngestError> {
        let evaluator =
            self.evaluator(config_id)
                .ok_or_else(|| IngestError::UnknownConfiguration {
                    config_id: config_id.to_string(),
                })?;
        evaluator.ingest(sample)
    }

    /// Current fitness total, frozen if finalized, live otherwise.
    pub fn total(&self, config_id: &str) -> Option<f64> {
        if let Some(result) = self
            .results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config_id)
        {
            return Some(result.total_score);
        }
        self.evaluator(config_id).map(|e| e.total())
    }

    /// Per-metric contributions, frozen if finalized, live otherwise.
    pub fn breakdown(&self, config_id: &str) -> Option<BTreeMap<String, f64>> {
        if let Some(result) = self
            .results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config_id)
        {
            return Some(result.breakdown.clone());
        }
        self.evaluator(config_id).map(|e| e.breakdown())
    }

    /// Freeze a configuration at `end_timestamp` and record its fitness.
    pub fn finalize(
        &self,
        config_id: &str,
        end_timestamp: f64,
    ) -> Result<ConfigurationFitness, IngestError> {
        let evaluator =
            self.evaluator(config_id)
                .ok_or_else(|| IngestError::UnknownConfiguration {
                    config_id: config_id.to_string(),
                })?;
        let fitness = evaluator.finalize(end_timestamp)?;
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(config_id.to_string(), fitness.clone());
        Ok(fitness)
    }

    /// Frozen fitness record, if the configuration has been finalized.
    pub fn fitness(&self, config_id: &str) -> Option<ConfigurationFitness> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config_id)
            .cloned()
    }

    /// Rank the named configurations descending by total.
    ///
    /// Unknown ids are skipped. Live totals are used for configurations not
    /// yet finalized, so a ranking mid-run reflects partial progress.
    pub fn rank(&self, config_ids: &[&str]) -> Vec<RankedConfiguration> {
        comparator::rank(
            config_ids
                .iter()
                .filter_map(|id| self.total(id).map(|total| (id.to_string(), total))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::definition::MetricDefinition;
    use crate::domain::metrics::sense::ImprovementSense;

    const TOL: f64 = 1e-9;

    fn aggregator() -> FitnessAggregator {
        let registry = MetricRegistry::new(vec![
            MetricDefinition::new("output", 10.0, ImprovementSense::Maximize { limit: 0.0 })
                .unwrap(),
        ])
        .unwrap();
        FitnessAggregator::new(Arc::new(registry))
    }

    #[test]
    fn test_start_is_idempotent() {
        let agg = aggregator();
        let first = agg.start_configuration("cfg-a");
        first
            .ingest(&MetricSample::new("output", 0.0, 10.0))
            .unwrap();
        first
            .ingest(&MetricSample::new("output", 5.0, 10.0))
            .unwrap();

        // Starting again must not reset accumulated state.
        let again = agg.start_configuration("cfg-a");
        assert!((again.total() - 5.0).abs() < TOL);
    }

    #[test]
    fn test_unknown_configuration() {
        let agg = aggregator();
        assert!(agg.total("missing").is_none());
        let err = agg
            .ingest("missing", &MetricSample::new("output", 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnknownConfiguration { .. }));
    }

    #[test]
    fn test_totals_and_ranking() {
        let agg = aggregator();
        agg.start_configuration("strong");
        agg.start_configuration("weak");

        // "strong" holds the objective, "weak" holds the limit.
        for t in [0.0, 10.0] {
            agg.ingest("strong", &MetricSample::new("output", t, 10.0))
                .unwrap();
            agg.ingest("weak", &MetricSample::new("output", t, 0.0))
                .unwrap();
        }

        agg.finalize("strong", 10.0).unwrap();
        agg.finalize("weak", 10.0).unwrap();

        assert!((agg.total("strong").unwrap() - 10.0).abs() < TOL);
        assert!(agg.total("weak").unwrap().abs() < TOL);

        let ranked = agg.rank(&["weak", "strong", "missing"]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].config_id, "strong");
        assert_eq!(ranked[1].config_id, "weak");
    }

    #[test]
    fn test_finalize_freezes_total() {
        let agg = aggregator();
        agg.start_configuration("cfg");
        agg.ingest("cfg", &MetricSample::new("output", 0.0, 10.0))
            .unwrap();

        let fitness = agg.finalize("cfg", 4.0).unwrap();
        assert!((fitness.total_score - 4.0).abs() < TOL);
        assert_eq!(agg.fitness("cfg").unwrap(), fitness);

        // Second finalize is an error, not a silent overwrite.
        assert!(matches!(
            agg.finalize("cfg", 8.0).unwrap_err(),
            IngestError::Finalized { .. }
        ));
        assert!((agg.total("cfg").unwrap() - 4.0).abs() < TOL);
    }
}
