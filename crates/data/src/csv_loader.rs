use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::io::{Read, Write};
use std::path::Path;
use ta_core::{Bar, DataError};
use tracing::{debug, info};

/// Load OHLCV bars from a CSV file.
///
/// See [`read_bars`] for the accepted layout.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path)?;
    let bars = read_bars(file)?;
    info!(path = %path.display(), bars = bars.len(), "Loaded bars from CSV");
    Ok(bars)
}

/// Read OHLCV bars from any CSV source.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `timestamp` (or `date`, `datetime`, `time`), `open`, `high`, `low`, `close`,
/// and optionally `volume`.
///
/// Rows come back sorted by timestamp; when a timestamp repeats, the first row
/// wins.
pub fn read_bars<R: Read>(source: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let cell = |idx: usize, field: &str| {
            record.get(idx).ok_or_else(|| {
                DataError::ParseError(format!("Row {} is missing the {} column", row + 1, field))
            })
        };

        let timestamp = parse_timestamp(cell(col_map.timestamp, "timestamp")?)?;
        let open = parse_price(cell(col_map.open, "open")?, "open")?;
        let high = parse_price(cell(col_map.high, "high")?, "high")?;
        let low = parse_price(cell(col_map.low, "low")?, "low")?;
        let close = parse_price(cell(col_map.close, "close")?, "close")?;
        let volume = match col_map.volume {
            Some(idx) => parse_price(cell(idx, "volume")?, "volume")?,
            None => 0.0,
        };

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    // Stable sort keeps file order among equal timestamps.
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() != before {
        debug!(dropped = before - bars.len(), "Dropped duplicate timestamps");
    }
    Ok(bars)
}

/// Write bars with a `timestamp,open,high,low,close,volume` header.
pub fn write_bars<W: Write>(sink: W, bars: &[Bar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(["timestamp", "open", "high", "low", "close", "volume"])
        .map_err(csv_error)?;

    for bar in bars {
        writer
            .write_record([
                bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let ts = find_column(headers, &["timestamp", "date", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No timestamp column found".into()))?;
    let open = find_column(headers, &["open", "o"])
        .ok_or_else(|| DataError::ParseError("No open column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;
    let volume = find_column(headers, &["volume", "vol", "v"]);

    Ok(BarColumnMap {
        timestamp: ts,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header.trim().to_lowercase().as_str()))
}

fn parse_price(s: &str, field: &str) -> Result<f64, DataError> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn csv_error(e: csv::Error) -> DataError {
    DataError::CsvError(e.to_string())
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    // RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Common formats without timezone, assumed UTC
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    // Unix seconds
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Unable to parse timestamp: '{}'",
        s
    )))
}
