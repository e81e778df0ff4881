use crate::params::{ensure_min_period, ConstructionError, Params};
use crate::Indicator;

/// Exponential Moving Average (EMA).
///
/// Seeded with the simple mean of the first `period` values, then
/// `ema = alpha * value + (1 - alpha) * prev` with `alpha = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: f64,
    current: Option<f64>,
    count: usize,
    /// Running mean of the values seen during warm-up.
    seed_mean: f64,
    /// Plain sum of the same values, used when the running mean overflows.
    seed_sum: f64,
}

impl Ema {
    pub const TAG: &'static str = "ExponentialMovingAverage";

    pub fn new(period: usize) -> Result<Self, ConstructionError> {
        let len = ensure_min_period("period", period, 1)?;
        Ok(Self {
            len,
            multiplier: 2.0 / (len as f64 + 1.0),
            current: None,
            count: 0,
            seed_mean: 0.0,
            seed_sum: 0.0,
        })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        Self::new(params.require_period("period", 1)?)
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.multiplier
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: f64) -> Option<f64> {
        match self.current {
            None => {
                // Incremental mean keeps a constant input exact.
                self.count += 1;
                self.seed_mean += (value - self.seed_mean) / self.count as f64;
                self.seed_sum += value;
                if self.count >= self.len {
                    let seed = if self.seed_mean.is_finite() {
                        self.seed_mean
                    } else {
                        self.seed_sum / self.len as f64
                    };
                    self.current = Some(seed);
                }
            }
            Some(prev) if value == prev => {}
            Some(prev) => {
                let ema = self.multiplier * value + (1.0 - self.multiplier) * prev;
                self.current = Some(ema);
            }
        }

        self.current
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx;

    #[test]
    fn test_ema_seed() {
        let mut ema = Ema::new(3).unwrap();
        assert_eq!(ema.next(2.0), None);
        assert_eq!(ema.next(4.0), None);
        // Third value → SMA seed = (2+4+6)/3 = 4
        assert_eq!(ema.next(6.0), Some(4.0));
    }

    #[test]
    fn test_ema_after_seed() {
        let mut ema = Ema::new(2).unwrap();
        assert_eq!(ema.next(2.0), None);
        assert_eq!(ema.next(4.0), Some(3.0));
        // alpha = 2/3: 2/3*6 + 1/3*3 = 5, then 2/3*8 + 1/3*5 = 7
        assert_approx(ema.next(6.0).unwrap(), 5.0);
        assert_approx(ema.next(8.0).unwrap(), 7.0);
    }

    #[test]
    fn test_ema_period_one_is_passthrough() {
        let mut ema = Ema::new(1).unwrap();
        assert_eq!(ema.smoothing_factor(), 1.0);
        for x in [100.0, 200.5, -3.0, 0.1] {
            assert_eq!(ema.next(x), Some(x));
        }
    }

    #[test]
    fn test_ema_constant_stream_is_exact() {
        let mut ema = Ema::new(5).unwrap();
        let outputs: Vec<_> = (0..20).map(|_| ema.next(0.1)).collect();
        assert!(outputs[..4].iter().all(Option::is_none));
        assert!(outputs[4..].iter().all(|v| *v == Some(0.1)));
    }

    #[test]
    fn test_ema_seed_survives_mean_overflow() {
        let mut ema = Ema::new(2).unwrap();
        assert_eq!(ema.next(f64::MAX), None);
        assert_eq!(ema.next(-f64::MAX), Some(0.0));
        assert!(ema.is_ready());
    }

    #[test]
    fn test_ema_rejects_zero_period() {
        assert!(Ema::new(0).is_err());
    }
}
