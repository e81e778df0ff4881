use crate::csv_loader;
use std::fs;
use std::path::{Path, PathBuf};
use ta_core::{Bar, DataError, DataProvider, SeriesKey};
use tracing::info;

/// Directory of raw series, one CSV per [`SeriesKey`], named by the key's
/// content hash.
///
/// Fetching missing series from a market-data vendor is left to the caller;
/// the store only reads and writes what it is given.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    root: PathBuf,
}

impl SeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &SeriesKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.path_for(key).is_file()
    }

    pub fn load(&self, key: &SeriesKey) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(DataError::NotFound(format!(
                "{} (expected {})",
                key,
                path.display()
            )));
        }
        csv_loader::load_bars_from_csv(&path)
    }

    /// Write `bars` for `key`, replacing any previous copy.
    pub fn store(&self, key: &SeriesKey, bars: &[Bar]) -> Result<PathBuf, DataError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let file = fs::File::create(&path)?;
        csv_loader::write_bars(file, bars)?;
        info!(series = %key, bars = bars.len(), path = %path.display(), "Stored series");
        Ok(path)
    }
}

impl DataProvider for SeriesStore {
    fn load_bars(&self, key: &SeriesKey) -> Result<Vec<Bar>, DataError> {
        self.load(key)
    }
}
