use crate::config::ModelConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use ta_core::{Bar, DataError, DataProvider};
use ta_indicators::{evaluate, values, ConstructionError, EvalSummary};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Failed to load series for {ticker}: {source}")]
    Data {
        ticker: String,
        #[source]
        source: DataError,
    },
    #[error("Cannot construct indicator '{name}': {source}")]
    Construction {
        name: String,
        #[source]
        source: ConstructionError,
    },
    #[error("Failed to write feature table: {0}")]
    Write(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One indicator column aligned to [`FeatureTable::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    /// `None` where the indicator is warming up, faulted, or has no bar.
    pub values: Vec<Option<f64>>,
}

/// Indicator columns outer-joined on timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub index: Vec<DateTime<Utc>>,
    pub columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Write as CSV: `timestamp,<column names...>`; absent values are empty
    /// fields.
    pub fn write_csv<W: Write>(&self, sink: W) -> Result<(), FeatureError> {
        let mut writer = csv::Writer::from_writer(sink);

        let mut header = vec!["timestamp"];
        header.extend(self.columns.iter().map(|c| c.name.as_str()));
        writer.write_record(&header).map_err(write_error)?;

        for (row, ts) in self.index.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(ts.to_rfc3339_opts(SecondsFormat::Secs, true));
            for column in &self.columns {
                record.push(
                    column
                        .values
                        .get(row)
                        .copied()
                        .flatten()
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&record).map_err(write_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_error(e: csv::Error) -> FeatureError {
    FeatureError::Write(e.to_string())
}

/// Compute every configured indicator over its source series and join the
/// results into one table.
///
/// Each distinct source is loaded once. Construction errors abort the build;
/// evaluation errors only blank out the affected column from the failing bar
/// onwards.
pub fn build_features(
    config: &ModelConfig,
    provider: &dyn DataProvider,
) -> Result<FeatureTable, FeatureError> {
    let mut series: HashMap<String, Vec<Bar>> = HashMap::new();
    for key in config.raw_inputs() {
        let bars = provider.load_bars(&key).map_err(|source| FeatureError::Data {
            ticker: key.ticker.clone(),
            source,
        })?;
        info!(series = %key, bars = bars.len(), "Loaded raw input");
        series.insert(key.ticker, bars);
    }

    let index: Vec<DateTime<Utc>> = series
        .values()
        .flat_map(|bars| bars.iter().map(|b| b.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position: HashMap<DateTime<Utc>, usize> =
        index.iter().enumerate().map(|(i, ts)| (*ts, i)).collect();

    let mut columns = Vec::with_capacity(config.indicators.len());
    for ind in &config.indicators {
        let mut instance = ta_indicators::create(&ind.kind, &ind.params).map_err(|source| {
            FeatureError::Construction {
                name: ind.name.clone(),
                source,
            }
        })?;

        let bars = series.get(&ind.source).map(Vec::as_slice).unwrap_or_default();
        let observations: Vec<f64> = bars.iter().map(|b| b.field(ind.field)).collect();
        let results = evaluate(&mut instance, &observations);
        instance.release();

        let summary = EvalSummary::from_results(&results);
        info!(
            column = %ind.name,
            indicator = %ind.kind,
            ready = summary.ready,
            warmup = summary.not_ready,
            errors = summary.errors,
            "Computed feature column"
        );
        if summary.errors > 0 {
            warn!(column = %ind.name, errors = summary.errors, "Column contains faulted positions");
        }

        let mut aligned = vec![None; index.len()];
        for (bar, value) in bars.iter().zip(values(&results)) {
            if let Some(&row) = position.get(&bar.timestamp) {
                aligned[row] = value;
            }
        }
        columns.push(FeatureColumn {
            name: ind.name.clone(),
            values: aligned,
        });
    }

    info!(rows = index.len(), columns = columns.len(), "Feature table built");
    Ok(FeatureTable { index, columns })
}
