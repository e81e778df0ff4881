//! Type-tag → constructor table.
//!
//! A [`Registry`] is immutable once built. The process-wide instance is set at
//! most once (see [`install`]) and falls back to the built-in indicators the
//! first time [`global`] is read.

use crate::ema::Ema;
use crate::instance::IndicatorInstance;
use crate::macd::Macd;
use crate::params::{ConstructionError, Params};
use crate::rsi::Rsi;
use crate::sma::Sma;
use crate::Indicator;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Validates parameters and builds a fresh, pre-warm-up state machine.
pub type Constructor = fn(&Params) -> Result<Box<dyn Indicator>, ConstructionError>;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

#[derive(Clone)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    /// Registry holding the built-in indicator kinds.
    pub fn builtin() -> Self {
        RegistryBuilder::with_builtins().build()
    }

    /// Build an indicator from its type tag and parameters.
    pub fn create(&self, tag: &str, params: &Params) -> Result<IndicatorInstance, ConstructionError> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| ConstructionError::UnknownType(tag.to_string()))?;

        let indicator = constructor(params)?;
        debug!(indicator = tag, period = indicator.period(), "Indicator constructed");
        Ok(IndicatorInstance::new(tag, indicator))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered type tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("tags", &self.tags()).finish()
    }
}

/// Collects tag/constructor pairs before the registry is frozen.
#[derive(Clone, Default)]
pub struct RegistryBuilder {
    constructors: HashMap<String, Constructor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        Self::new()
            .register(Sma::TAG, |p| Ok(Box::new(Sma::from_params(p)?)))
            .register(Ema::TAG, |p| Ok(Box::new(Ema::from_params(p)?)))
            .register(Rsi::TAG, |p| Ok(Box::new(Rsi::from_params(p)?)))
            .register(Macd::TAG, |p| Ok(Box::new(Macd::from_params(p)?)))
    }

    /// Add (or replace) the constructor for `tag`.
    pub fn register(mut self, tag: impl Into<String>, constructor: Constructor) -> Self {
        let tag = tag.into();
        if self.constructors.insert(tag.clone(), constructor).is_some() {
            debug!(indicator = %tag, "Replacing registered constructor");
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            constructors: self.constructors,
        }
    }
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("registered", &self.constructors.len())
            .finish()
    }
}

/// Install the process-wide registry. Must happen before the first call to
/// [`global`]; afterwards the registry is frozen and the rejected one is
/// handed back.
pub fn install(registry: Registry) -> Result<(), Registry> {
    let tags = registry.constructors.len();
    GLOBAL.set(registry)?;
    debug!(tags, "Indicator registry installed");
    Ok(())
}

/// The process-wide registry.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::builtin)
}
