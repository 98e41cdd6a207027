use crate::domain::errors::ConfigError;
use crate::domain::metrics::sense::ImprovementSense;
use serde::{Deserialize, Serialize};

/// Shape parameters of the normalization curve.
///
/// `a` controls curvature beyond a limit (the bad side), `b` the slope at the
/// limit, `c` the normalized value at the limit, and `g` the curvature beyond
/// the objective (the good side). The defaults are the library constants and
/// are recommended for most metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveShape {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub g: f64,
}

impl Default for CurveShape {
    fn default() -> Self {
        Self {
            a: 5.0,
            b: 5.0,
            c: 0.0,
            g: 0.2,
        }
    }
}

/// Static description of one tracked metric.
///
/// Immutable once constructed; `new`/`with_shape` validate every invariant the
/// curve mathematics relies on, so a definition that exists is always usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    pub objective: f64,
    pub sense: ImprovementSense,
    #[serde(default)]
    pub shape: CurveShape,
}

impl MetricDefinition {
    pub fn new(
        id: impl Into<String>,
        objective: f64,
        sense: ImprovementSense,
    ) -> Result<Self, ConfigError> {
        Self::with_shape(id, objective, sense, CurveShape::default())
    }

    pub fn with_shape(
        id: impl Into<String>,
        objective: f64,
        sense: ImprovementSense,
        shape: CurveShape,
    ) -> Result<Self, ConfigError> {
        let def = Self {
            id: id.into(),
            objective,
            sense,
            shape,
        };
        def.validate()?;
        Ok(def)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.objective.is_finite() {
            return Err(ConfigError::NonFiniteParameter {
                id: self.id.clone(),
                name: "objective",
                value: self.objective,
            });
        }

        match self.sense {
            ImprovementSense::Minimize { limit } => {
                self.check_finite_limit("limit", limit)?;
                if limit == self.objective {
                    return Err(self.objective_equals_limit());
                }
                if limit < self.objective {
                    return Err(ConfigError::MinimizeLimitBelowObjective {
                        id: self.id.clone(),
                        limit,
                        objective: self.objective,
                    });
                }
            }
            ImprovementSense::Maximize { limit } => {
                self.check_finite_limit("limit", limit)?;
                if limit == self.objective {
                    return Err(self.objective_equals_limit());
                }
                if limit > self.objective {
                    return Err(ConfigError::MaximizeLimitAboveObjective {
                        id: self.id.clone(),
                        limit,
                        objective: self.objective,
                    });
                }
            }
            ImprovementSense::SeekValue {
                lower_limit,
                upper_limit,
            } => {
                self.check_finite_limit("lower_limit", lower_limit)?;
                self.check_finite_limit("upper_limit", upper_limit)?;
                if lower_limit == self.objective || upper_limit == self.objective {
                    return Err(self.objective_equals_limit());
                }
                if !(lower_limit < self.objective && self.objective < upper_limit) {
                    return Err(ConfigError::SeekBandExcludesObjective {
                        id: self.id.clone(),
                        lower: lower_limit,
                        upper: upper_limit,
                        objective: self.objective,
                    });
                }
            }
        }

        Ok(())
    }

    fn check_finite_limit(&self, name: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::NonFiniteParameter {
                id: self.id.clone(),
                name,
                value,
            })
        }
    }

    fn objective_equals_limit(&self) -> ConfigError {
        ConfigError::ObjectiveEqualsLimit {
            id: self.id.clone(),
            objective: self.objective,
        }
    }
}
