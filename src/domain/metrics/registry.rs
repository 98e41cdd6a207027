use crate::domain::errors::{ConfigError, NormalizationError};
use crate::domain::metrics::curve::{self, NormalizationCurve};
use crate::domain::metrics::definition::MetricDefinition;
use crate::domain::metrics::sense::ImprovementSense;
use std::collections::HashMap;
use tracing::info;

/// A metric definition paired with its cached normalization curve.
///
/// Built once at registry time; `normalize` only selects the limit for the
/// sense and evaluates the cached curve.
#[derive(Debug, Clone)]
pub struct NormalizedMetric {
    definition: MetricDefinition,
    curve: NormalizationCurve,
}

impl NormalizedMetric {
    pub fn new(definition: MetricDefinition) -> Result<Self, ConfigError> {
        let curve = NormalizationCurve::build(&definition.id, definition.shape)?;
        Ok(Self { definition, curve })
    }

    pub fn definition(&self) -> &MetricDefinition {
        &self.definition
    }

    pub fn curve(&self) -> &NormalizationCurve {
        &self.curve
    }

    /// Convert a raw value into a unitless score.
    ///
    /// Seek-value metrics use the lower limit below the objective and the
    /// upper limit at or above it; the two half-curves are independent and
    /// may disagree at the objective itself. That jump is documented
    /// behavior, never smoothed here.
    pub fn normalize(&self, value: f64) -> Result<f64, NormalizationError> {
        if !value.is_finite() {
            return Err(NormalizationError::NonFiniteValue {
                metric_id: self.definition.id.clone(),
                value,
            });
        }

        let limit = match self.definition.sense {
            ImprovementSense::Minimize { limit } => limit,
            ImprovementSense::Maximize { limit } => limit,
            ImprovementSense::SeekValue {
                lower_limit,
                upper_limit,
            } => {
                if value < self.definition.objective {
                    lower_limit
                } else {
                    upper_limit
                }
            }
        };

        let x = curve::pre_normalize(value, limit, self.definition.objective);
        let score = self.curve.eval_prenormalized(x);
        if score.is_finite() {
            Ok(score)
        } else {
            Err(NormalizationError::DomainViolation {
                metric_id: self.definition.id.clone(),
                value,
            })
        }
    }
}

/// Owns every tracked metric's definition and cached curve for the lifetime
/// of a run.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    metrics: HashMap<String, NormalizedMetric>,
}

impl MetricRegistry {
    /// Build the registry, deriving and caching each curve up front.
    ///
    /// Any malformed definition or duplicate id aborts construction before a
    /// run can start.
    pub fn new(definitions: Vec<MetricDefinition>) -> Result<Self, ConfigError> {
        let mut metrics = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let id = definition.id.clone();
            if metrics.contains_key(&id) {
                return Err(ConfigError::DuplicateMetric { id });
            }
            metrics.insert(id, NormalizedMetric::new(definition)?);
        }

        info!(metrics = metrics.len(), "metric registry built");
        Ok(Self { metrics })
    }

    pub fn get(&self, metric_id: &str) -> Option<&NormalizedMetric> {
        self.metrics.get(metric_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
