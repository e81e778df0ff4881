use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Which bar component is fed to an indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" | "o" => Ok(PriceField::Open),
            "high" | "h" => Ok(PriceField::High),
            "low" | "l" => Ok(PriceField::Low),
            "close" | "c" => Ok(PriceField::Close),
            "volume" | "vol" | "v" => Ok(PriceField::Volume),
            other => Err(format!("unknown price field '{other}'")),
        }
    }
}

/// Bar resolution of a raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    OneMinute,
    FiveMinutes,
    TenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl Resolution {
    /// Stable name used when hashing series keys. Changing it invalidates
    /// every stored series.
    pub fn name(&self) -> &'static str {
        match self {
            Resolution::OneMinute => "ONE_MINUTE",
            Resolution::FiveMinutes => "FIVE_MINUTES",
            Resolution::TenMinutes => "TEN_MINUTES",
            Resolution::ThirtyMinutes => "THIRTY_MINUTES",
            Resolution::OneHour => "ONE_HOUR",
            Resolution::OneDay => "ONE_DAY",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Series identity
// ---------------------------------------------------------------------------

/// Identifies one raw series: a ticker at a resolution over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub ticker: String,
    pub resolution: Resolution,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl SeriesKey {
    pub fn new(
        ticker: impl Into<String>,
        resolution: Resolution,
        first_date: NaiveDate,
        last_date: NaiveDate,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            resolution,
            first_date,
            last_date,
        }
    }

    /// Hex SHA-256 over ticker, resolution name and both ISO dates.
    pub fn content_hash(&self) -> String {
        let mut sha = Sha256::new();
        sha.update(self.ticker.as_bytes());
        sha.update(self.resolution.name().as_bytes());
        sha.update(self.first_date.format("%Y-%m-%d").to_string().as_bytes());
        sha.update(self.last_date.format("%Y-%m-%d").to_string().as_bytes());
        hex::encode(sha.finalize())
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.content_hash())
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} [{}..{}]",
            self.ticker, self.resolution, self.first_date, self.last_date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> SeriesKey {
        SeriesKey::new(
            "AAPL",
            Resolution::OneDay,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_content_hash_matches_concatenation() {
        let expected = hex::encode(Sha256::digest(b"AAPLONE_DAY2020-01-012020-12-31"));
        assert_eq!(key().content_hash(), expected);
        assert_eq!(key().file_name(), format!("{expected}.csv"));
    }

    #[test]
    fn test_content_hash_is_sensitive_to_every_field() {
        let base = key().content_hash();
        let mut other = key();
        other.ticker = "MSFT".into();
        assert_ne!(other.content_hash(), base);

        let mut other = key();
        other.resolution = Resolution::OneHour;
        assert_ne!(other.content_hash(), base);

        let mut other = key();
        other.last_date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_ne!(other.content_hash(), base);
        assert_eq!(key().content_hash().len(), 64);
    }

    #[test]
    fn test_resolution_serde_names() {
        let r: Resolution = serde_json::from_str("\"thirty_minutes\"").unwrap();
        assert_eq!(r, Resolution::ThirtyMinutes);
        assert_eq!(r.name(), "THIRTY_MINUTES");
    }

    #[test]
    fn test_bar_field() {
        let bar = Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 1.0,
            high: 4.0,
            low: 0.5,
            close: 2.0,
            volume: 100.0,
        };
        assert_eq!(bar.field(PriceField::Close), 2.0);
        assert_eq!(bar.field(PriceField::High), 4.0);
        assert_eq!(bar.field(PriceField::default()), 2.0);
        assert_eq!("Vol".parse::<PriceField>(), Ok(PriceField::Volume));
        assert!("vwap".parse::<PriceField>().is_err());
    }
}
