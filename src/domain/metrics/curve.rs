use crate::domain::errors::ConfigError;
use crate::domain::metrics::definition::CurveShape;

/// Closed-form constants derived once from the shape parameters.
///
/// `d` is the slope term of the feasible (limit-to-objective) segment, `f`
/// and `psi` position that segment so it meets the quadratic at the limit
/// with matching value and derivative, and `h`/`phi` do the same for the
/// super-optimal segment at the objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveCoefficients {
    pub c: f64,
    pub d: f64,
    pub f: f64,
    pub h: f64,
    pub psi: f64,
    pub phi: f64,
}

impl CurveCoefficients {
    /// Derive the cached constants, rejecting shapes whose denominators or
    /// square-root arguments would be non-positive. These checks run at
    /// construction time so evaluation never has to.
    pub fn derive(id: &str, shape: &CurveShape) -> Result<Self, ConfigError> {
        let CurveShape { a, b, c, g } = *shape;

        for (name, value) in [("a", a), ("b", b), ("c", c), ("g", g)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteParameter {
                    id: id.to_string(),
                    name,
                    value,
                });
            }
        }
        if a < 0.0 {
            return Err(degenerate(id, format!("a must be non-negative (got {a})")));
        }
        if b <= 0.0 {
            return Err(degenerate(id, format!("b must be positive (got {b})")));
        }
        if g <= 0.0 {
            return Err(degenerate(id, format!("g must be positive (got {g})")));
        }
        let denom = c + b - 1.0;
        if denom <= 0.0 {
            return Err(degenerate(
                id,
                format!("c + b - 1 must be positive (got {denom})"),
            ));
        }

        // (c - 1)^2, written out as in the source formulation.
        let numer = c * c - 2.0 * c + 1.0;
        let d = (b * numer / denom).sqrt();
        if d <= 0.0 {
            return Err(degenerate(
                id,
                format!("c must differ from 1 so the feasible slope is positive (got c = {c})"),
            ));
        }

        let f = (d / (2.0 * b)).powi(2);
        let psi = (d * d) / (2.0 * b);
        let h = (g * g) * (f + 1.0) / (d * d);
        let phi = g * h.sqrt();

        Ok(Self {
            c,
            d,
            f,
            h,
            psi,
            phi,
        })
    }
}

fn degenerate(id: &str, reason: String) -> ConfigError {
    ConfigError::DegenerateShape {
        id: id.to_string(),
        reason,
    }
}

/// One normalization curve: shape parameters plus their derived constants.
///
/// Evaluation operates on the pre-normalized axis where 0 is the limit and 1
/// is the objective, in the maximize orientation. Minimization arrives here
/// already mirrored by the pre-normalization, so a single kernel serves both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationCurve {
    shape: CurveShape,
    co: CurveCoefficients,
}

impl NormalizationCurve {
    pub fn build(id: &str, shape: CurveShape) -> Result<Self, ConfigError> {
        let co = CurveCoefficients::derive(id, &shape)?;
        Ok(Self { shape, co })
    }

    pub fn shape(&self) -> &CurveShape {
        &self.shape
    }

    pub fn coefficients(&self) -> &CurveCoefficients {
        &self.co
    }

    /// Evaluate the curve at a pre-normalized position.
    ///
    /// Three regimes: quadratic below the limit, square-root between limit
    /// and objective, flatter square-root beyond the objective. Value and
    /// first derivative match at both seams; the two upper formulas agree at
    /// exactly 1, so the boundary assignment there is arbitrary.
    pub fn eval_prenormalized(&self, x: f64) -> f64 {
        if x < 0.0 {
            self.violated(x)
        } else if x < 1.0 {
            self.feasible(x)
        } else {
            self.super_optimal(x)
        }
    }

    fn violated(&self, x: f64) -> f64 {
        -(self.shape.a * x * x) / 2.0 + self.shape.b * x + self.co.c
    }

    fn feasible(&self, x: f64) -> f64 {
        self.co.d * (x + self.co.f).sqrt() + self.co.c - self.co.psi
    }

    fn super_optimal(&self, x: f64) -> f64 {
        self.shape.g * (x + self.co.h - 1.0).sqrt() - self.co.phi + 1.0
    }
}

/// Map a raw value onto the curve axis: 0 at the limit, 1 at the objective.
///
/// Without this step the span between limit and objective would skew one
/// metric's pressure against another's.
pub fn pre_normalize(raw_value: f64, limit: f64, objective: f64) -> f64 {
    (raw_value - limit) / (objective - limit)
}
