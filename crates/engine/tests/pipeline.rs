//! End to end: raw CSV in a series store -> config -> feature CSV.

use chrono::{Duration, TimeZone, Utc};
use ta_core::Bar;
use ta_data::SeriesStore;
use ta_engine::{build_features, FeatureError, ModelConfig};

const CONFIG: &str = r#"
[training_data]
resolution = "one_day"
first_date = "2024-01-01"
last_date = "2024-01-31"

[[indicators]]
name = "spy_sma_5"
source = "SPY"
type = "SimpleMovingAverage"
params = { period = 5 }

[[indicators]]
name = "spy_rsi_14"
source = "SPY"
type = "RelativeStrengthIndex"
params = { period = 14 }

[[indicators]]
name = "spy_macd"
source = "SPY"
type = "MovingAverageConvergenceDivergence"
params = { fast_period = 3, slow_period = 6, signal_period = 2 }
"#;

fn rising_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            Bar {
                timestamp: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

#[test]
fn features_from_series_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let config = ModelConfig::from_toml_str(CONFIG).unwrap();

    let inputs = config.raw_inputs();
    assert_eq!(inputs.len(), 1);
    store.store(&inputs[0], &rising_bars(30)).unwrap();

    let table = build_features(&config, &store).unwrap();
    assert_eq!(table.len(), 30);

    let sma = table.column("spy_sma_5").unwrap();
    assert_eq!(sma.values.iter().position(Option::is_some), Some(4));
    assert_eq!(sma.values[4], Some(102.0));

    let rsi = table.column("spy_rsi_14").unwrap();
    assert_eq!(rsi.values.iter().position(Option::is_some), Some(14));
    assert!(rsi.values[14..].iter().all(|v| *v == Some(100.0)));

    let macd = table.column("spy_macd").unwrap();
    assert_eq!(macd.values.iter().position(Option::is_some), Some(6));

    let out = dir.path().join("features.csv");
    table.write_csv(std::fs::File::create(&out).unwrap()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("timestamp,spy_sma_5,spy_rsi_14,spy_macd\n"));
    assert_eq!(text.lines().count(), 31);
}

#[test]
fn missing_series_reports_ticker() {
    let dir = tempfile::tempdir().unwrap();
    let store = SeriesStore::new(dir.path());
    let config = ModelConfig::from_toml_str(CONFIG).unwrap();

    let err = build_features(&config, &store).unwrap_err();
    assert!(matches!(err, FeatureError::Data { ref ticker, .. } if ticker == "SPY"));
}
