use crate::params::{ensure_min_period, ConstructionError, Params};
use crate::Indicator;

/// Relative Strength Index (RSI).
/// Uses Wilder's smoothing for average gain/loss.
///
/// The first `period` price changes are averaged to seed the gain/loss
/// averages; afterwards `avg = (avg * (period - 1) + x) / period`.
/// A window with no movement at all reads 50.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<f64>,
    count: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
}

impl Rsi {
    pub const TAG: &'static str = "RelativeStrengthIndex";

    pub fn new(period: usize) -> Result<Self, ConstructionError> {
        let len = ensure_min_period("period", period, 2)?;
        Ok(Self {
            len,
            prev_value: None,
            count: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
        })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        Self::new(params.require_period("period", 2)?)
    }

    pub fn value(&self) -> Option<f64> {
        if !self.seeded {
            return None;
        }
        let rsi = if self.avg_gain == 0.0 && self.avg_loss == 0.0 {
            50.0
        } else if self.avg_loss == 0.0 {
            100.0
        } else {
            let rs = self.avg_gain / self.avg_loss;
            100.0 - 100.0 / (1.0 + rs)
        };
        Some(rsi)
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: f64) -> Option<f64> {
        let prev = self.prev_value.replace(value)?;

        let change = value - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.len as f64;

        if self.seeded {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        } else {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.count += 1;

            if self.count < self.len {
                return None;
            }
            self.avg_gain = self.gain_sum / n;
            self.avg_loss = self.loss_sum / n;
            self.seeded = true;
        }

        self.value()
    }

    fn period(&self) -> usize {
        self.len + 1 // need one extra data point for the first change
    }

    fn is_ready(&self) -> bool {
        self.seeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx;

    #[test]
    fn test_rsi_seed_then_smooth() {
        let mut rsi = Rsi::new(2).unwrap();
        assert_eq!(rsi.next(1.0), None);
        assert_eq!(rsi.next(2.0), None);
        // avg_gain = avg_loss = 0.5
        assert_eq!(rsi.next(1.0), Some(50.0));
        // avg_gain = 0.75, avg_loss = 0.25 → RS = 3
        assert_eq!(rsi.next(2.0), Some(75.0));
    }

    #[test]
    fn test_rsi_all_gains() {
        let mut rsi = Rsi::new(3).unwrap();
        let out: Vec<_> = (0..8).map(|i| rsi.next(100.0 + i as f64)).collect();
        assert!(out[..3].iter().all(Option::is_none));
        assert!(out[3..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_rsi_all_losses() {
        let mut rsi = Rsi::new(3).unwrap();
        let out: Vec<_> = (0..8).map(|i| rsi.next(100.0 - i as f64)).collect();
        assert!(out[3..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let mut rsi = Rsi::new(4).unwrap();
        let out: Vec<_> = (0..10).map(|_| rsi.next(42.0)).collect();
        assert!(out[4..].iter().all(|v| *v == Some(50.0)));
    }

    #[test]
    fn test_rsi_mixed() {
        // Changes: +0.34, -0.25, -0.48 → avg_gain = 0.34/3, avg_loss = 0.73/3
        let mut rsi = Rsi::new(3).unwrap();
        for v in [44.0, 44.34, 44.09] {
            assert_eq!(rsi.next(v), None);
        }
        let first = rsi.next(43.61).unwrap();
        assert_approx(first, 100.0 - 100.0 / (1.0 + 0.34 / 0.73));
    }

    #[test]
    fn test_rsi_bounds() {
        let mut rsi = Rsi::new(3).unwrap();
        for v in [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0] {
            if let Some(r) = rsi.next(v) {
                assert!((0.0..=100.0).contains(&r), "RSI out of bounds: {r}");
            }
        }
    }

    #[test]
    fn test_rsi_requires_period_two() {
        assert!(matches!(
            Rsi::new(1),
            Err(ConstructionError::InvalidParamValue { .. })
        ));
        assert_eq!(Rsi::new(14).unwrap().warmup(), 14);
    }
}
