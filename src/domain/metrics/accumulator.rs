use crate::domain::errors::SampleError;

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastSample {
    timestamp: f64,
    score: f64,
}

/// Per-metric running state: the time integral of the normalized score.
///
/// Integration uses the trapezoidal average of consecutive scores over each
/// interval; only the closing `finalize` segment holds the last score
/// constant, since no later sample exists to average with. Samples at the
/// same timestamp contribute zero area but refresh the stored score.
#[derive(Debug, Clone, Default)]
pub struct AccumulatorState {
    last: Option<LastSample>,
    integral: f64,
    elapsed: f64,
    frozen: bool,
}

impl AccumulatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a normalized score at a timestamp.
    ///
    /// The first call only seeds the state; every later call integrates the
    /// interval since the previous sample. Rejects timestamps that move
    /// backwards, leaving the state untouched.
    pub fn update(&mut self, timestamp: f64, score: f64) -> Result<(), SampleError> {
        if self.frozen {
            return Err(SampleError::Frozen);
        }

        match self.last {
            None => {
                self.last = Some(LastSample { timestamp, score });
                Ok(())
            }
            Some(prev) => {
                if timestamp < prev.timestamp {
                    return Err(SampleError::OutOfOrder {
                        timestamp,
                        last_timestamp: prev.timestamp,
                    });
                }
                let dt = timestamp - prev.timestamp;
                self.integral += dt * (prev.score + score) / 2.0;
                self.elapsed += dt;
                self.last = Some(LastSample { timestamp, score });
                Ok(())
            }
        }
    }

    /// Close the integral at `end_timestamp`, holding the last score
    /// constant over the trailing interval, then freeze the state.
    ///
    /// A metric that never received a sample finalizes with a zero integral.
    /// Returns the final integral value.
    pub fn finalize(&mut self, end_timestamp: f64) -> Result<f64, SampleError> {
        if self.frozen {
            return Err(SampleError::Frozen);
        }

        if let Some(prev) = self.last {
            if end_timestamp < prev.timestamp {
                return Err(SampleError::OutOfOrder {
                    timestamp: end_timestamp,
                    last_timestamp: prev.timestamp,
                });
            }
            let dt = end_timestamp - prev.timestamp;
            self.integral += dt * prev.score;
            self.elapsed += dt;
            self.last = Some(LastSample {
                timestamp: end_timestamp,
                score: prev.score,
            });
        }

        self.frozen = true;
        Ok(self.integral)
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Total simulated time covered so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Time-mean of the normalized score, or `None` before any interval has
    /// elapsed.
    pub fn mean_score(&self) -> Option<f64> {
        if self.elapsed > 0.0 {
            Some(self.integral / self.elapsed)
        } else {
            None
        }
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last.map(|s| s.timestamp)
    }

    pub fn last_score(&self) -> Option<f64> {
        self.last.map(|s| s.score)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_first_sample_does_not_integrate() {
        let mut acc = AccumulatorState::new();
        acc.update(5.0, 0.8).unwrap();
        assert_eq!(acc.integral(), 0.0);
        assert_eq!(acc.elapsed(), 0.0);
        assert_eq!(acc.last_timestamp(), Some(5.0));
        assert_eq!(acc.last_score(), Some(0.8));
    }

    #[test]
    fn test_trapezoidal_accumulation() {
        let mut acc = AccumulatorState::new();
        acc.update(0.0, 1.0).unwrap();
        acc.update(10.0, 0.5).unwrap();
        // (1.0 + 0.5) / 2 * 10
        assert!((acc.integral() - 7.5).abs() < TOL);
        acc.update(14.0, 0.5).unwrap();
        assert!((acc.integral() - 9.5).abs() < TOL);
        assert!((acc.elapsed() - 14.0).abs() < TOL);
    }

    #[test]
    fn test_constant_score_integration_identity() {
        // Held constant at s from t0 to t1, the integral is s * (t1 - t0).
        let mut acc = AccumulatorState::new();
        acc.update(3.0, 0.75).unwrap();
        let total = acc.finalize(11.0).unwrap();
        assert!((total - 0.75 * 8.0).abs() < TOL);
        assert_eq!(acc.mean_score(), Some(0.75));
    }

    #[test]
    fn test_out_of_order_rejected_without_mutation() {
        let mut acc = AccumulatorState::new();
        acc.update(0.0, 1.0).unwrap();
        acc.update(10.0, 1.0).unwrap();
        let before = acc.integral();

        let err = acc.update(4.0, 0.0).unwrap_err();
        assert!(matches!(err, SampleError::OutOfOrder { .. }));
        assert_eq!(acc.integral(), before);
        assert_eq!(acc.last_timestamp(), Some(10.0));
    }

    #[test]
    fn test_equal_timestamp_adds_no_area_but_refreshes_score() {
        let mut acc = AccumulatorState::new();
        acc.update(0.0, 1.0).unwrap();
        acc.update(0.0, 0.0).unwrap();
        assert_eq!(acc.integral(), 0.0);
        assert_eq!(acc.last_score(), Some(0.0));
        // The refreshed score drives the next interval.
        acc.update(10.0, 0.0).unwrap();
        assert_eq!(acc.integral(), 0.0);
    }

    #[test]
    fn test_finalize_freezes() {
        let mut acc = AccumulatorState::new();
        acc.update(0.0, 1.0).unwrap();
        acc.finalize(5.0).unwrap();
        assert!(acc.is_frozen());
        assert!(matches!(acc.update(6.0, 1.0), Err(SampleError::Frozen)));
        assert!(matches!(acc.finalize(7.0), Err(SampleError::Frozen)));
    }

    #[test]
    fn test_finalize_before_last_sample_rejected() {
        let mut acc = AccumulatorState::new();
        acc.update(10.0, 1.0).unwrap();
        assert!(matches!(
            acc.finalize(5.0),
            Err(SampleError::OutOfOrder { .. })
        ));
        // A rejected finalize leaves the state live.
        assert!(!acc.is_frozen());
    }

    #[test]
    fn test_finalize_without_samples_is_zero() {
        let mut acc = AccumulatorState::new();
        assert_eq!(acc.finalize(100.0).unwrap(), 0.0);
        assert_eq!(acc.mean_score(), None);
    }
}
