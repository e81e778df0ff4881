use crate::models::*;

// ---------------------------------------------------------------------------
// Data Provider Trait
// ---------------------------------------------------------------------------

/// Errors that can occur during data operations.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Provides raw bar series for feature building.
pub trait DataProvider: Send + Sync {
    /// Load the bars of one series, sorted by timestamp.
    fn load_bars(&self, key: &SeriesKey) -> Result<Vec<Bar>, DataError>;
}
