use crate::domain::errors::{IngestError, NormalizationError};
use crate::domain::fitness::ConfigurationFitness;
use crate::domain::metrics::accumulator::AccumulatorState;
use crate::domain::metrics::registry::MetricRegistry;
use crate::domain::metrics::sample::MetricSample;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Scores one candidate configuration.
///
/// Holds one locked accumulator per registered metric, so samples for
/// different metrics never contend and there is no global lock. Each metric
/// is single-writer by contract; the lock only serializes a writer against
/// concurrent snapshot reads.
///
/// A normalization failure poisons the whole configuration: the first such
/// error is recorded, and every later `ingest` and `finalize` returns it
/// instead of an ordinary-looking result.
pub struct ConfigurationEvaluator {
    config_id: String,
    registry: Arc<MetricRegistry>,
    accumulators: HashMap<String, Mutex<AccumulatorState>>,
    fatal: Mutex<Option<NormalizationError>>,
}

fn lock(cell: &Mutex<AccumulatorState>) -> MutexGuard<'_, AccumulatorState> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConfigurationEvaluator {
    pub fn new(config_id: impl Into<String>, registry: Arc<MetricRegistry>) -> Self {
        let accumulators = registry
            .ids()
            .map(|id| (id.to_string(), Mutex::new(AccumulatorState::new())))
            .collect();
        Self {
            config_id: config_id.into(),
            registry,
            accumulators,
            fatal: Mutex::new(None),
        }
    }

    /// The first normalization failure recorded for this configuration.
    pub fn fatal_error(&self) -> Option<NormalizationError> {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_fatal(&self, err: &NormalizationError) {
        let mut slot = self.fatal.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err.clone());
        }
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    pub fn metric_ids(&self) -> impl Iterator<Item = &str> {
        self.accumulators.keys().map(String::as_str)
    }

    /// Normalize one raw sample and fold it into its metric's integral.
    ///
    /// Returns the normalized score. Unknown ids and out-of-order timestamps
    /// are rejected without touching any state; a normalization failure
    /// poisons the configuration and is returned for every sample from then
    /// on.
    pub fn ingest(&self, sample: &MetricSample) -> Result<f64, IngestError> {
        if let Some(err) = self.fatal_error() {
            return Err(err.into());
        }

        let metric = self
            .registry
            .get(&sample.metric_id)
            .ok_or_else(|| IngestError::UnknownMetric {
                metric_id: sample.metric_id.clone(),
            })?;

        let score = match metric.normalize(sample.value) {
            Ok(score) => score,
            Err(err) => {
                self.record_fatal(&err);
                return Err(err.into());
            }
        };

        let cell = self
            .accumulators
            .get(&sample.metric_id)
            .ok_or_else(|| IngestError::UnknownMetric {
                metric_id: sample.metric_id.clone(),
            })?;

        lock(cell)
            .update(sample.timestamp, score)
            .map_err(|err| IngestError::rejected(sample.metric_id.clone(), err))?;

        Ok(score)
    }

    /// Live sum of every metric's integral so far.
    ///
    /// May run concurrently with ingestion; the result reflects whatever
    /// partial integrals exist at that instant.
    pub fn total(&self) -> f64 {
        self.accumulators
            .values()
            .map(|cell| lock(cell).integral())
            .sum()
    }

    /// Live per-metric contributions for diagnostics.
    pub fn breakdown(&self) -> BTreeMap<String, f64> {
        self.accumulators
            .iter()
            .map(|(id, cell)| (id.clone(), lock(cell).integral()))
            .collect()
    }

    /// Per-metric time-mean scores; metrics with no elapsed time are absent.
    pub fn mean_scores(&self) -> BTreeMap<String, f64> {
        self.accumulators
            .iter()
            .filter_map(|(id, cell)| lock(cell).mean_score().map(|m| (id.clone(), m)))
            .collect()
    }

    /// Close every metric's integral at `end_timestamp` and freeze the
    /// configuration.
    ///
    /// Callers aborting a run early pass their last known timestamp here to
    /// get a valid partial fitness instead of hanging state. The freeze is
    /// all-or-nothing: every accumulator is validated before any is frozen,
    /// so a rejected finalize leaves the evaluator live and a corrected
    /// retry succeeds, mirroring the out-of-order update contract.
    pub fn finalize(&self, end_timestamp: f64) -> Result<ConfigurationFitness, IngestError> {
        if let Some(err) = self.fatal_error() {
            return Err(err.into());
        }

        // Hold every lock across validation and freeze so no sample can
        // slip in between the two passes.
        let mut guards: Vec<(&str, MutexGuard<'_, AccumulatorState>)> = self
            .accumulators
            .iter()
            .map(|(id, cell)| (id.as_str(), lock(cell)))
            .collect();

        for (id, guard) in &guards {
            if guard.is_frozen() {
                return Err(IngestError::Finalized {
                    id: (*id).to_string(),
                });
            }
            if let Some(last) = guard.last_timestamp() {
                if end_timestamp < last {
                    return Err(IngestError::OutOfOrderSample {
                        metric_id: (*id).to_string(),
                        timestamp: end_timestamp,
                        last_timestamp: last,
                    });
                }
            }
        }

        let mut breakdown = BTreeMap::new();
        for (id, guard) in &mut guards {
            let integral = guard
                .finalize(end_timestamp)
                .map_err(|err| IngestError::rejected((*id).to_string(), err))?;
            breakdown.insert((*id).to_string(), integral);
        }

        let total_score: f64 = breakdown.values().sum();
        info!(
            config_id = %self.config_id,
            total_score,
            end_timestamp,
            "configuration finalized"
        );

        Ok(ConfigurationFitness {
            config_id: self.config_id.clone(),
            total_score,
            breakdown,
        })
    }
}
