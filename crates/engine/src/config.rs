//! Model configuration: the training window and the indicator columns to
//! compute over it.
//!
//! ```toml
//! [training_data]
//! resolution = "one_day"
//! first_date = "2020-01-01"
//! last_date  = "2020-12-31"
//!
//! [[indicators]]
//! name   = "aapl_rsi_14"
//! source = "AAPL"
//! type   = "RelativeStrengthIndex"
//! params = { period = 14 }
//! ```

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use ta_core::{PriceField, Resolution, SeriesKey};
use ta_indicators::Params;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No indicators configured")]
    NoIndicators,
    #[error("Duplicate indicator name '{0}'")]
    DuplicateName(String),
    #[error("Indicator '{name}' has an empty {field}")]
    EmptyField { name: String, field: &'static str },
    #[error("first_date {first} is after last_date {last}")]
    DateRange { first: NaiveDate, last: NaiveDate },
}

/// Shared resolution and date range of every raw input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainingData {
    pub resolution: Resolution,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorConfig {
    /// Column name in the feature table.
    pub name: String,
    /// Ticker of the raw series the indicator reads.
    pub source: String,
    /// Registry type tag.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Params,
    /// Bar component fed to the indicator.
    #[serde(default)]
    pub field: PriceField,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub training_data: TrainingData,
    #[serde(default)]
    pub indicators: Vec<IndicatorConfig>,
}

impl ModelConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ModelConfig = toml::from_str(text)?;
        config.validate()?;
        debug!(
            indicators = config.indicators.len(),
            inputs = config.raw_inputs().len(),
            "Model config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let td = &self.training_data;
        if td.first_date > td.last_date {
            return Err(ConfigError::DateRange {
                first: td.first_date,
                last: td.last_date,
            });
        }
        if self.indicators.is_empty() {
            return Err(ConfigError::NoIndicators);
        }

        let mut seen = HashSet::new();
        for ind in &self.indicators {
            for (field, value) in [("name", &ind.name), ("source", &ind.source), ("type", &ind.kind)] {
                if value.trim().is_empty() {
                    return Err(ConfigError::EmptyField {
                        name: ind.name.clone(),
                        field,
                    });
                }
            }
            if !seen.insert(ind.name.as_str()) {
                return Err(ConfigError::DuplicateName(ind.name.clone()));
            }
        }
        Ok(())
    }

    /// Series key for `ticker` over the training window.
    pub fn series_key(&self, ticker: &str) -> SeriesKey {
        let td = &self.training_data;
        SeriesKey::new(ticker, td.resolution, td.first_date, td.last_date)
    }

    /// Distinct raw series the indicators read, in first-use order.
    pub fn raw_inputs(&self) -> Vec<SeriesKey> {
        let mut seen = HashSet::new();
        self.indicators
            .iter()
            .filter(|ind| seen.insert(ind.source.as_str()))
            .map(|ind| self.series_key(&ind.source))
            .collect()
    }
}
