use crate::application::evaluator::ConfigurationEvaluator;
use crate::domain::errors::IngestError;
use crate::domain::metrics::sample::MetricSample;
use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, warn};

/// Explicit ingestion queue per metric, each drained by a single writer.
///
/// Samples for the same metric keep their arrival order inside one queue;
/// samples for different metrics flow through independent queues and threads,
/// so sources need no ordering relative to each other. A recoverable
/// rejection drops the one sample; a normalization failure stops that
/// metric's worker and is surfaced loudly.
pub struct SampleRouter {
    queues: HashMap<String, Sender<MetricSample>>,
    workers: Vec<JoinHandle<()>>,
}

impl SampleRouter {
    /// Spawn one worker per metric registered for the evaluator's
    /// configuration.
    pub fn spawn(evaluator: Arc<ConfigurationEvaluator>) -> Result<Self> {
        let mut queues = HashMap::new();
        let mut workers = Vec::new();

        let metric_ids: Vec<String> = evaluator.metric_ids().map(str::to_string).collect();
        for metric_id in metric_ids {
            let (tx, rx) = crossbeam_channel::unbounded::<MetricSample>();
            let worker_evaluator = Arc::clone(&evaluator);
            let worker_id = metric_id.clone();

            let handle = std::thread::Builder::new()
                .name(format!("metric-{metric_id}"))
                .spawn(move || {
                    for sample in rx {
                        match worker_evaluator.ingest(&sample) {
                            Ok(_) => {}
                            Err(err) if err.is_recoverable() => {
                                warn!(metric_id = %worker_id, %err, "sample dropped");
                            }
                            Err(err) => {
                                error!(
                                    metric_id = %worker_id,
                                    config_id = %worker_evaluator.config_id(),
                                    %err,
                                    "normalization failure; stopping metric worker"
                                );
                                break;
                            }
                        }
                    }
                })
                .with_context(|| format!("failed to spawn worker for metric '{metric_id}'"))?;

            queues.insert(metric_id, tx);
            workers.push(handle);
        }

        Ok(Self { queues, workers })
    }

    /// Enqueue a sample onto its metric's queue.
    pub fn route(&self, sample: MetricSample) -> Result<(), IngestError> {
        let tx = self
            .queues
            .get(&sample.metric_id)
            .ok_or_else(|| IngestError::UnknownMetric {
                metric_id: sample.metric_id.clone(),
            })?;

        tx.send(sample).map_err(|send_err| IngestError::QueueClosed {
            metric_id: send_err.into_inner().metric_id,
        })
    }

    /// Close every queue and wait for the workers to drain.
    pub fn shutdown(mut self) {
        self.queues.clear();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::definition::MetricDefinition;
    use crate::domain::metrics::registry::MetricRegistry;
    use crate::domain::metrics::sense::ImprovementSense;

    const TOL: f64 = 1e-9;

    fn evaluator() -> Arc<ConfigurationEvaluator> {
        let registry = MetricRegistry::new(vec![
            MetricDefinition::new("freq", 60.0, ImprovementSense::SeekValue {
                lower_limit: 59.5,
                upper_limit: 60.5,
            })
            .unwrap(),
            MetricDefinition::new("losses", 0.0, ImprovementSense::Minimize { limit: 100.0 })
                .unwrap(),
        ])
        .unwrap();
        Arc::new(ConfigurationEvaluator::new("cfg", Arc::new(registry)))
    }

    #[test]
    fn test_routes_to_per_metric_queues() {
        let evaluator = evaluator();
        let router = SampleRouter::spawn(Arc::clone(&evaluator)).unwrap();

        router.route(MetricSample::new("freq", 0.0, 60.0)).unwrap();
        router.route(MetricSample::new("losses", 0.0, 0.0)).unwrap();
        router.route(MetricSample::new("freq", 10.0, 60.0)).unwrap();
        router.route(MetricSample::new("losses", 10.0, 0.0)).unwrap();
        router.shutdown();

        let breakdown = evaluator.breakdown();
        assert!((breakdown["freq"] - 10.0).abs() < TOL);
        assert!((breakdown["losses"] - 10.0).abs() < TOL);
    }

    #[test]
    fn test_unknown_metric_rejected_at_routing() {
        let router = SampleRouter::spawn(evaluator()).unwrap();
        let err = router
            .route(MetricSample::new("nonexistent", 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnknownMetric { .. }));
        router.shutdown();
    }

    #[test]
    fn test_recoverable_rejections_do_not_kill_worker() {
        let evaluator = evaluator();
        let router = SampleRouter::spawn(Arc::clone(&evaluator)).unwrap();

        router.route(MetricSample::new("freq", 10.0, 60.0)).unwrap();
        // Out of order: dropped by the worker, queue stays alive.
        router.route(MetricSample::new("freq", 5.0, 60.0)).unwrap();
        router.route(MetricSample::new("freq", 20.0, 60.0)).unwrap();
        router.shutdown();

        assert!((evaluator.breakdown()["freq"] - 10.0).abs() < TOL);
    }

    #[test]
    fn test_normalization_failure_surfaces_at_finalize() {
        let evaluator = evaluator();
        let router = SampleRouter::spawn(Arc::clone(&evaluator)).unwrap();

        router.route(MetricSample::new("freq", 0.0, 60.0)).unwrap();
        // Non-finite value: the worker stops and the configuration is
        // poisoned, not just logged.
        router.route(MetricSample::new("freq", 10.0, f64::NAN)).unwrap();
        router.shutdown();

        assert!(evaluator.fatal_error().is_some());
        let err = evaluator.finalize(10.0).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
