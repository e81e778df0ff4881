use crate::eval::{Eval, EvalError};
use crate::Indicator;
use std::fmt;
use tracing::{debug, warn};

/// An owned, live indicator built by the registry.
///
/// Wraps one state machine with its type tag and the terminal-error flag: the
/// first `Error` is latched and returned for every later observation without
/// touching the underlying state again.
pub struct IndicatorInstance {
    tag: String,
    inner: Box<dyn Indicator>,
    fault: Option<EvalError>,
    produced: bool,
}

impl IndicatorInstance {
    pub fn new(tag: impl Into<String>, inner: Box<dyn Indicator>) -> Self {
        Self {
            tag: tag.into(),
            inner,
            fault: None,
            produced: false,
        }
    }

    /// Feed the next observation, in time order.
    pub fn advance(&mut self, value: f64) -> Eval {
        if let Some(kind) = self.fault {
            return Eval::Error(kind);
        }
        if !value.is_finite() {
            return self.fail(EvalError::NonFiniteInput);
        }

        match self.inner.next(value) {
            Some(out) if out.is_finite() => {
                self.produced = true;
                Eval::Ready(out)
            }
            Some(_) => self.fail(EvalError::InternalInvariantViolation),
            // Once warmed up an indicator must keep producing.
            None if self.produced => self.fail(EvalError::InternalInvariantViolation),
            None => Eval::NotReady,
        }
    }

    fn fail(&mut self, kind: EvalError) -> Eval {
        warn!(indicator = %self.tag, error = %kind, "Indicator faulted; ignoring further observations");
        self.fault = Some(kind);
        Eval::Error(kind)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Observations needed before the first value.
    pub fn period(&self) -> usize {
        self.inner.period()
    }

    /// Leading observations that report `NotReady`.
    pub fn warmup(&self) -> usize {
        self.inner.warmup()
    }

    pub fn is_ready(&self) -> bool {
        self.fault.is_none() && self.inner.is_ready()
    }

    pub fn fault(&self) -> Option<EvalError> {
        self.fault
    }

    /// Release the instance. Equivalent to dropping it.
    pub fn release(self) {
        debug!(indicator = %self.tag, "Indicator released");
    }
}

impl fmt::Debug for IndicatorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorInstance")
            .field("tag", &self.tag)
            .field("inner", &self.inner)
            .field("fault", &self.fault)
            .finish()
    }
}
