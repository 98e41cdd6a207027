use serde::{Deserialize, Serialize};
use std::fmt;

/// The improvement sense of a metric without its limit values.
///
/// Used by the descriptor layer while it decides which limit keys apply;
/// the validated form is [`ImprovementSense`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenseKind {
    Minimize,
    Maximize,
    SeekValue,
}

impl std::str::FromStr for SenseKind {
    type Err = anyhow::Error;

    /// Lenient parse: accepts `minimize`/`min`, `maximize`/`max`,
    /// `seek value`/`seekvalue`/`seek`, and the digits 0, 1, 2.
    /// Case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimize" | "min" | "0" => Ok(SenseKind::Minimize),
            "maximize" | "max" | "1" => Ok(SenseKind::Maximize),
            "seek value" | "seekvalue" | "seek" | "2" => Ok(SenseKind::SeekValue),
            _ => anyhow::bail!(
                "invalid sense: {}. Must be 'Minimize', 'Maximize' or 'SeekValue'",
                s
            ),
        }
    }
}

impl fmt::Display for SenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseKind::Minimize => write!(f, "Minimize"),
            SenseKind::Maximize => write!(f, "Maximize"),
            SenseKind::SeekValue => write!(f, "Seek Value"),
        }
    }
}

impl SenseKind {
    /// Infer a sense from which limits a descriptor supplied.
    ///
    /// Lower limit only means maximize, upper limit only means minimize,
    /// both mean seek value. With neither, no determination can be made.
    pub fn infer(lower_limit: Option<f64>, upper_limit: Option<f64>) -> Option<SenseKind> {
        match (lower_limit, upper_limit) {
            (None, None) => None,
            (Some(_), None) => Some(SenseKind::Maximize),
            (None, Some(_)) => Some(SenseKind::Minimize),
            (Some(_), Some(_)) => Some(SenseKind::SeekValue),
        }
    }

    /// Infer a sense from a single limit relative to the objective.
    ///
    /// A limit below the objective means maximize, above means minimize.
    /// Equal values admit no determination.
    pub fn infer_from_limit(limit: f64, objective: f64) -> Option<SenseKind> {
        if limit < objective {
            Some(SenseKind::Maximize)
        } else if limit > objective {
            Some(SenseKind::Minimize)
        } else {
            None
        }
    }
}

/// The improvement sense together with its limit value(s).
///
/// One variant per sense, fixed at registry-construction time; no per-sample
/// re-dispatch happens beyond matching on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImprovementSense {
    /// Lower raw values are better; `limit` is the highest acceptable value.
    Minimize { limit: f64 },
    /// Higher raw values are better; `limit` is the lowest acceptable value.
    Maximize { limit: f64 },
    /// Raw values closest to the objective are best, bounded on both sides.
    SeekValue { lower_limit: f64, upper_limit: f64 },
}

impl ImprovementSense {
    pub fn kind(&self) -> SenseKind {
        match self {
            ImprovementSense::Minimize { .. } => SenseKind::Minimize,
            ImprovementSense::Maximize { .. } => SenseKind::Maximize,
            ImprovementSense::SeekValue { .. } => SenseKind::SeekValue,
        }
    }
}

impl fmt::Display for ImprovementSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}
