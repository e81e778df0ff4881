//! Streaming technical indicators.
//!
//! Every indicator consumes one observation at a time, keeps bounded state and
//! reports a tri-state [`Eval`] per observation. Instances are built from a type
//! tag and a parameter map through the [`registry`], and driven either one
//! observation at a time ([`IndicatorInstance::advance`]) or over a whole series
//! with the [`batch`] adapter.

pub mod batch;
pub mod ema;
pub mod eval;
pub mod instance;
pub mod macd;
pub mod params;
pub mod registry;
pub mod rsi;
pub mod sma;

pub use batch::{evaluate, values, EvalSummary};
pub use eval::{Eval, EvalError};
pub use instance::IndicatorInstance;
pub use params::{ConstructionError, ParamValue, Params};
pub use registry::{Registry, RegistryBuilder};

/// Trait for streaming (incremental) indicators.
/// Feed one finite value at a time; the indicator maintains internal state.
///
/// Implementations assume finite input. Non-finite observations and the
/// terminal-error policy are handled by [`IndicatorInstance`].
pub trait Indicator: Send + Sync + std::fmt::Debug {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: f64) -> Option<f64>;

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;

    /// Number of leading observations that produce no output.
    fn warmup(&self) -> usize {
        self.period().saturating_sub(1)
    }
}

/// Construct an indicator through the process-wide registry.
pub fn create(tag: &str, params: &Params) -> Result<IndicatorInstance, ConstructionError> {
    registry::global().create(tag, params)
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "assert_approx failed: actual={actual}, expected={expected}"
    );
}
