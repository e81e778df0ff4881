use crate::ema::Ema;
use crate::params::{ConstructionError, Params};
use crate::Indicator;

/// MACD (Moving Average Convergence Divergence).
///
/// Composed of three EMAs:
/// - Fast EMA (`fast_period`, commonly 12)
/// - Slow EMA (`slow_period`, commonly 26)
/// - Signal EMA (`signal_period`, commonly 9) over the MACD line
///
/// `next` returns the histogram (MACD line minus signal line). Use `output()`
/// for all three components.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
    macd_line: Option<f64>,
    signal_line: Option<f64>,
}

/// MACD output with all three components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Macd {
    pub const TAG: &'static str = "MovingAverageConvergenceDivergence";

    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, ConstructionError> {
        if fast_period >= slow_period {
            return Err(ConstructionError::invalid_value(
                "fast_period",
                format!("must be less than slow_period ({fast_period} >= {slow_period})"),
            ));
        }
        Ok(Self {
            fast_ema: Ema::new(fast_period).map_err(|e| rename_param(e, "fast_period"))?,
            slow_ema: Ema::new(slow_period).map_err(|e| rename_param(e, "slow_period"))?,
            signal_ema: Ema::new(signal_period).map_err(|e| rename_param(e, "signal_period"))?,
            macd_line: None,
            signal_line: None,
        })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        let fast = params.require_period("fast_period", 1)?;
        let slow = params.require_period("slow_period", 1)?;
        let signal = params.require_period("signal_period", 1)?;
        Self::new(fast, slow, signal)
    }

    /// Returns the full MACD output (macd, signal, histogram) if ready.
    pub fn output(&self) -> Option<MacdOutput> {
        match (self.macd_line, self.signal_line) {
            (Some(macd), Some(signal)) => Some(MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            }),
            _ => None,
        }
    }

    /// Process next value and return full output if ready.
    pub fn next_output(&mut self, value: f64) -> Option<MacdOutput> {
        let fast = self.fast_ema.next(value);
        let slow = self.slow_ema.next(value);

        if let (Some(f), Some(s)) = (fast, slow) {
            let macd = f - s;
            self.macd_line = Some(macd);
            self.signal_line = self.signal_ema.next(macd);
        }

        self.output()
    }
}

fn rename_param(err: ConstructionError, param: &str) -> ConstructionError {
    match err {
        ConstructionError::InvalidParamValue { reason, .. } => {
            ConstructionError::invalid_value(param, reason)
        }
        other => other,
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: f64) -> Option<f64> {
        self.next_output(value).map(|o| o.histogram)
    }

    fn period(&self) -> usize {
        self.slow_ema.period() + self.signal_ema.period() - 1
    }

    fn is_ready(&self) -> bool {
        self.signal_line.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx;

    #[test]
    fn test_macd_histogram() {
        let mut macd = Macd::new(2, 3, 2).unwrap();
        let outputs: Vec<_> = [0.0, 2.0, 1.0, 10.0, 5.0]
            .into_iter()
            .map(|v| macd.next(v))
            .collect();

        assert_eq!(&outputs[..3], &[None, None, None]);
        assert_approx(outputs[3].unwrap(), 0.75);
        assert_approx(outputs[4].unwrap(), -1.0 / 9.0);
    }

    #[test]
    fn test_macd_output_components() {
        let mut macd = Macd::new(2, 3, 2).unwrap();
        for v in [0.0, 2.0, 1.0, 10.0] {
            macd.next(v);
        }
        let out = macd.output().unwrap();
        assert_approx(out.macd, 1.5);
        assert_approx(out.signal, 0.75);
        assert_approx(out.histogram, out.macd - out.signal);
    }

    #[test]
    fn test_macd_warmup() {
        let macd = Macd::new(12, 26, 9).unwrap();
        assert_eq!(macd.warmup(), 26 + 9 - 2);

        let mut macd = Macd::new(3, 5, 4).unwrap();
        let outputs: Vec<_> = (0..12).map(|i| macd.next(i as f64 * 1.5)).collect();
        let first_ready = outputs.iter().position(Option::is_some).unwrap();
        assert_eq!(first_ready, macd.warmup());
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        match Macd::new(26, 12, 9) {
            Err(ConstructionError::InvalidParamValue { param, .. }) => {
                assert_eq!(param, "fast_period")
            }
            other => panic!("Expected InvalidParamValue, got {other:?}"),
        }
        match Macd::new(2, 5, 0) {
            Err(ConstructionError::InvalidParamValue { param, .. }) => {
                assert_eq!(param, "signal_period")
            }
            other => panic!("Expected InvalidParamValue, got {other:?}"),
        }
    }
}
