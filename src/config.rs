use crate::domain::errors::ConfigError;
use crate::domain::metrics::definition::{CurveShape, MetricDefinition};
use crate::domain::metrics::sense::{ImprovementSense, SenseKind};
use serde::Deserialize;

/// One metric entry as the surrounding orchestration supplies it.
///
/// Consumed, not owned, by the engine: `into_definition` resolves the sense,
/// picks the applicable limit keys and hands back a validated definition.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub objective: f64,
    #[serde(default)]
    pub sense: Option<String>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub lower_limit: Option<f64>,
    #[serde(default)]
    pub upper_limit: Option<f64>,
    // Shape overrides; defaults are the library constants.
    #[serde(default)]
    pub a: Option<f64>,
    #[serde(default)]
    pub b: Option<f64>,
    #[serde(default)]
    pub c: Option<f64>,
    #[serde(default)]
    pub g: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricSet {
    #[serde(default)]
    pub metrics: Vec<MetricDescriptor>,
}

impl MetricDescriptor {
    /// Resolve this descriptor into a validated definition.
    ///
    /// When `sense` is omitted it is inferred: lower limit only means
    /// maximize, upper limit only means minimize, both mean seek value; a
    /// bare `limit` is read from its side of the objective.
    pub fn into_definition(self) -> Result<MetricDefinition, ConfigError> {
        let kind = self.resolve_sense()?;

        let sense = match kind {
            SenseKind::Maximize => ImprovementSense::Maximize {
                limit: self.limit.or(self.lower_limit).ok_or_else(|| {
                    self.invalid("a maximize metric needs `limit` or `lower_limit`")
                })?,
            },
            SenseKind::Minimize => ImprovementSense::Minimize {
                limit: self.limit.or(self.upper_limit).ok_or_else(|| {
                    self.invalid("a minimize metric needs `limit` or `upper_limit`")
                })?,
            },
            SenseKind::SeekValue => ImprovementSense::SeekValue {
                lower_limit: self.lower_limit.ok_or_else(|| {
                    self.invalid("a seek-value metric needs `lower_limit`")
                })?,
                upper_limit: self.upper_limit.ok_or_else(|| {
                    self.invalid("a seek-value metric needs `upper_limit`")
                })?,
            },
        };

        let defaults = CurveShape::default();
        let shape = CurveShape {
            a: self.a.unwrap_or(defaults.a),
            b: self.b.unwrap_or(defaults.b),
            c: self.c.unwrap_or(defaults.c),
            g: self.g.unwrap_or(defaults.g),
        };

        MetricDefinition::with_shape(self.name, self.objective, sense, shape)
    }

    fn resolve_sense(&self) -> Result<SenseKind, ConfigError> {
        if let Some(raw) = &self.sense {
            return raw
                .parse::<SenseKind>()
                .map_err(|err| self.invalid(&err.to_string()));
        }

        SenseKind::infer(self.lower_limit, self.upper_limit)
            .or_else(|| {
                self.limit
                    .and_then(|limit| SenseKind::infer_from_limit(limit, self.objective))
            })
            .ok_or_else(|| self.invalid("sense cannot be inferred; supply `sense` or limits"))
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidDescriptor {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Parse a `[[metrics]]` TOML document into validated definitions.
pub fn parse_metric_set(toml_str: &str) -> Result<Vec<MetricDefinition>, ConfigError> {
    let set: MetricSet =
        toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
    set.metrics
        .into_iter()
        .map(MetricDescriptor::into_definition)
        .collect()
}
