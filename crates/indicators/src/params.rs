use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Errors raised while constructing an indicator. No instance is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    #[error("Unknown indicator type: {0}")]
    UnknownType(String),
    #[error("Missing required parameter '{param}'")]
    MissingParam { param: String },
    #[error("Parameter '{param}' must be {expected}, got {found}")]
    InvalidParamType {
        param: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid value for parameter '{param}': {reason}")]
    InvalidParamValue { param: String, reason: String },
}

impl ConstructionError {
    pub(crate) fn invalid_value(param: &str, reason: impl Into<String>) -> Self {
        ConstructionError::InvalidParamValue {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single indicator parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl ParamValue {
    /// Parse a textual value, trying the most specific type first:
    /// integer, float, bool, then string.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return ParamValue::Int(v);
        }
        if let Ok(v) = s.parse::<f64>() {
            return ParamValue::Float(v);
        }
        if let Ok(v) = s.parse::<bool>() {
            return ParamValue::Bool(v);
        }
        ParamValue::Str(s.to_string())
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Key/value parameter set handed to an indicator constructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `key=value` assignment, e.g. `period=14`.
    pub fn parse_assignment(s: &str) -> Option<(String, ParamValue)> {
        let (key, value) = s.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), ParamValue::parse(value)))
    }

    /// Fetch a required integer parameter and check it is at least `min`.
    pub fn require_period(&self, key: &str, min: usize) -> Result<usize, ConstructionError> {
        let value = self.get(key).ok_or_else(|| ConstructionError::MissingParam {
            param: key.to_string(),
        })?;

        let raw = match value {
            ParamValue::Int(v) => *v,
            other => {
                return Err(ConstructionError::InvalidParamType {
                    param: key.to_string(),
                    expected: "integer",
                    found: other.type_name(),
                })
            }
        };

        let period = usize::try_from(raw).map_err(|_| {
            ConstructionError::invalid_value(key, format!("must be >= {min}, got {raw}"))
        })?;
        ensure_min_period(key, period, min)
    }
}

/// Range check shared by the parameter map and the typed constructors.
pub(crate) fn ensure_min_period(
    key: &str,
    period: usize,
    min: usize,
) -> Result<usize, ConstructionError> {
    if period < min {
        return Err(ConstructionError::invalid_value(
            key,
            format!("must be >= {min}, got {period}"),
        ));
    }
    Ok(period)
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Params(iter.into_iter().collect())
    }
}
