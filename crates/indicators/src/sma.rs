use crate::params::{ensure_min_period, ConstructionError, Params};
use crate::Indicator;
use std::collections::VecDeque;

/// Simple Moving Average (SMA).
///
/// Keeps the last `period` observations in a ring buffer together with their
/// running sum. The first value is produced on the call that fills the buffer.
///
/// The buffer grows as it fills, so construction allocates nothing. Updates
/// are amortized O(1): the sum is recomputed from the window once every
/// `period` evictions.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<f64>,
    sum: f64,
    /// Evictions since the sum was last recomputed from the window.
    since_resum: usize,
}

impl Sma {
    pub const TAG: &'static str = "SimpleMovingAverage";

    pub fn new(period: usize) -> Result<Self, ConstructionError> {
        let len = ensure_min_period("period", period, 1)?;
        Ok(Self {
            len,
            buffer: VecDeque::new(),
            sum: 0.0,
            since_resum: 0,
        })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        Self::new(params.require_period("period", 1)?)
    }

    /// Get the current SMA value without feeding new data.
    pub fn value(&self) -> Option<f64> {
        if self.buffer.len() == self.len {
            Some(self.sum / self.len as f64)
        } else {
            None
        }
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: f64) -> Option<f64> {
        if self.buffer.len() < self.len {
            self.buffer.push_back(value);
            self.sum += value;
            return self.value();
        }

        let evicted = self.buffer.pop_front().unwrap_or_default();
        self.buffer.push_back(value);
        self.since_resum += 1;

        // Re-sum once per full rotation so rounding error cannot accumulate.
        if self.since_resum >= self.len {
            self.sum = self.buffer.iter().sum();
            self.since_resum = 0;
        } else {
            self.sum += value - evicted;
        }

        self.value()
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}
