use serde::Serialize;
use std::fmt;

/// Outcome of feeding one observation to an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Eval {
    /// The indicator produced a value for this observation.
    Ready(f64),
    /// Still warming up; no value yet.
    NotReady,
    /// The instance is faulted. Every later call reports the same error.
    Error(EvalError),
}

impl Eval {
    /// The produced value, treating warm-up and errors as absent.
    pub fn value(&self) -> Option<f64> {
        match self {
            Eval::Ready(v) => Some(*v),
            Eval::NotReady | Eval::Error(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Eval::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Eval::Error(_))
    }
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eval::Ready(v) => write!(f, "{v}"),
            Eval::NotReady => f.write_str("not_ready"),
            Eval::Error(kind) => write!(f, "error:{}", kind.as_str()),
        }
    }
}

/// Per-call evaluation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum EvalError {
    #[error("Observation is NaN or infinite")]
    NonFiniteInput,
    #[error("Indicator state violated an internal invariant")]
    InternalInvariantViolation,
}

impl EvalError {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalError::NonFiniteInput => "non_finite_input",
            EvalError::InternalInvariantViolation => "internal_invariant_violation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_treats_warmup_and_error_as_absent() {
        assert_eq!(Eval::Ready(1.5).value(), Some(1.5));
        assert_eq!(Eval::NotReady.value(), None);
        assert_eq!(Eval::Error(EvalError::NonFiniteInput).value(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Eval::Ready(2.5).to_string(), "2.5");
        assert_eq!(Eval::NotReady.to_string(), "not_ready");
        assert_eq!(
            Eval::Error(EvalError::NonFiniteInput).to_string(),
            "error:non_finite_input"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_string(&Eval::Ready(3.0)).unwrap();
        assert_eq!(json, r#"{"status":"ready","value":3.0}"#);
        let json = serde_json::to_string(&Eval::NotReady).unwrap();
        assert_eq!(json, r#"{"status":"not_ready"}"#);
        let json = serde_json::to_string(&Eval::Error(EvalError::InternalInvariantViolation)).unwrap();
        assert_eq!(json, r#"{"status":"error","value":"internal_invariant_violation"}"#);
    }
}
