use thiserror::Error;

/// Errors raised while building metric definitions or the registry.
///
/// All of these surface before a run starts; a configuration that fails here
/// is never evaluated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("metric '{id}': objective ({objective}) must not equal the limit")]
    ObjectiveEqualsLimit { id: String, objective: f64 },

    #[error("metric '{id}': a maximize limit must be below the objective ({limit} >= {objective})")]
    MaximizeLimitAboveObjective { id: String, limit: f64, objective: f64 },

    #[error("metric '{id}': a minimize limit must be above the objective ({limit} <= {objective})")]
    MinimizeLimitBelowObjective { id: String, limit: f64, objective: f64 },

    #[error(
        "metric '{id}': seek-value band must satisfy lower < objective < upper \
         (got [{lower}, {upper}] around {objective})"
    )]
    SeekBandExcludesObjective {
        id: String,
        lower: f64,
        upper: f64,
        objective: f64,
    },

    #[error("metric '{id}': {name} must be finite (got {value})")]
    NonFiniteParameter {
        id: String,
        name: &'static str,
        value: f64,
    },

    #[error("metric '{id}': degenerate shape parameters: {reason}")]
    DegenerateShape { id: String, reason: String },

    #[error("duplicate metric id '{id}'")]
    DuplicateMetric { id: String },

    #[error("metric descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("failed to parse metric descriptors: {0}")]
    Parse(String),
}

/// Curve evaluation left its numeric domain at run time.
///
/// The shape checks at construction make this unreachable for well-formed
/// definitions, so hitting one of these signals a latent configuration bug
/// and is fatal for that metric's configuration.
#[derive(Debug, Clone, Error)]
pub enum NormalizationError {
    #[error("metric '{metric_id}': raw value is not finite ({value})")]
    NonFiniteValue { metric_id: String, value: f64 },

    #[error("metric '{metric_id}': curve evaluation left its domain at {value}")]
    DomainViolation { metric_id: String, value: f64 },
}

/// State-level sample rejection, without metric identity attached.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    #[error("timestamp {timestamp} precedes last recorded {last_timestamp}")]
    OutOfOrder { timestamp: f64, last_timestamp: f64 },

    #[error("accumulator is frozen")]
    Frozen,
}

/// Per-sample errors during a run.
///
/// `UnknownMetric` and `OutOfOrderSample` are recoverable: the sample is
/// dropped and reported, other metrics are unaffected. `Normalization` is
/// fatal for the metric's configuration.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unknown metric id '{metric_id}'")]
    UnknownMetric { metric_id: String },

    #[error("out-of-order sample for '{metric_id}': {timestamp} < {last_timestamp}")]
    OutOfOrderSample {
        metric_id: String,
        timestamp: f64,
        last_timestamp: f64,
    },

    #[error("'{id}' is already finalized; sample rejected")]
    Finalized { id: String },

    #[error("ingestion queue for '{metric_id}' is closed")]
    QueueClosed { metric_id: String },

    #[error("unknown configuration id '{config_id}'")]
    UnknownConfiguration { config_id: String },

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl IngestError {
    /// Attach a metric id to a state-level rejection.
    pub fn rejected(metric_id: impl Into<String>, err: SampleError) -> Self {
        match err {
            SampleError::OutOfOrder {
                timestamp,
                last_timestamp,
            } => IngestError::OutOfOrderSample {
                metric_id: metric_id.into(),
                timestamp,
                last_timestamp,
            },
            SampleError::Frozen => IngestError::Finalized {
                id: metric_id.into(),
            },
        }
    }

    /// Whether the engine may drop the offending sample and keep running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, IngestError::Normalization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_formatting() {
        let err = IngestError::rejected(
            "bus_voltage",
            SampleError::OutOfOrder {
                timestamp: 4.0,
                last_timestamp: 9.5,
            },
        );

        let msg = err.to_string();
        assert!(msg.contains("bus_voltage"));
        assert!(msg.contains("4 < 9.5"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_frozen_maps_to_finalized() {
        let err = IngestError::rejected("outage_minutes", SampleError::Frozen);
        assert!(matches!(err, IngestError::Finalized { ref id } if id == "outage_minutes"));
    }

    #[test]
    fn test_normalization_error_is_fatal() {
        let err = IngestError::from(NormalizationError::NonFiniteValue {
            metric_id: "feeder_loss".to_string(),
            value: f64::NAN,
        });
        assert!(!err.is_recoverable());
    }
}
