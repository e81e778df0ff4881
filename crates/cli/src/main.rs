use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use ta_core::{PriceField, Resolution, SeriesKey};
use ta_data::{csv_loader, SeriesStore};
use ta_engine::{build_features, ModelConfig};
use ta_indicators::{evaluate, Eval, EvalSummary, ParamValue, Params};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "ta")]
#[command(about = "Streaming technical indicators: evaluate series and build feature tables")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered indicator types
    Indicators,

    /// Run one indicator over a CSV of bars
    Eval {
        /// Path to CSV data file
        #[arg(short, long)]
        data: PathBuf,

        /// Indicator type tag (e.g. "RelativeStrengthIndex")
        #[arg(short, long)]
        indicator: String,

        /// Indicator parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,

        /// Bar component fed to the indicator
        #[arg(short, long, default_value = "close")]
        field: PriceField,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Build the feature table described by a model config
    Features {
        /// Path to the model TOML
        #[arg(short, long)]
        config: PathBuf,

        /// Series store directory
        #[arg(short, long)]
        store: PathBuf,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Manage the series store
    #[command(name = "data")]
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import bars from a CSV file into the series store
    Import {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Ticker to file the series under
        #[arg(short, long)]
        ticker: String,

        /// Bar resolution (one_minute ... one_day)
        #[arg(short, long, value_parser = parse_resolution)]
        resolution: Resolution,

        /// First date of the series (YYYY-MM-DD)
        #[arg(long)]
        first_date: NaiveDate,

        /// Last date of the series (YYYY-MM-DD)
        #[arg(long)]
        last_date: NaiveDate,

        /// Series store directory
        #[arg(short, long)]
        store: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Serialize)]
struct EvalRow<'a> {
    timestamp: DateTime<Utc>,
    input: f64,
    result: &'a Eval,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Indicators => {
            println!("Available indicators:");
            for tag in ta_indicators::registry::global().tags() {
                println!("  {tag}");
            }
        }
        Commands::Eval {
            data,
            indicator,
            params,
            field,
            format,
        } => {
            let params: Params = params.into_iter().collect();
            run_eval(data, &indicator, &params, field, format)?;
        }
        Commands::Features { config, store, out } => {
            run_features(config, store, out)?;
        }
        Commands::Data { command } => match command {
            DataCommands::Import {
                file,
                ticker,
                resolution,
                first_date,
                last_date,
                store,
            } => {
                if first_date > last_date {
                    anyhow::bail!("first date {first_date} is after last date {last_date}");
                }
                let key = SeriesKey::new(ticker, resolution, first_date, last_date);
                import_data(file, key, store)?;
            }
        },
    }

    Ok(())
}

fn run_eval(
    data_path: PathBuf,
    tag: &str,
    params: &Params,
    field: PriceField,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!(
        indicator = %tag,
        params = %describe_params(params),
        field = %field,
        data = %data_path.display(),
        "Evaluating indicator"
    );

    let bars = csv_loader::load_bars_from_csv(&data_path)?;
    if bars.is_empty() {
        anyhow::bail!("No bars loaded from CSV file");
    }

    let mut instance = ta_indicators::create(tag, params)
        .with_context(|| format!("Cannot construct {tag}"))?;
    let inputs: Vec<f64> = bars.iter().map(|b| b.field(field)).collect();
    let results = evaluate(&mut instance, &inputs);
    instance.release();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Csv => {
            writeln!(out, "timestamp,input,result")?;
            for ((bar, input), result) in bars.iter().zip(&inputs).zip(&results) {
                writeln!(
                    out,
                    "{},{},{}",
                    bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    input,
                    result
                )?;
            }
        }
        OutputFormat::Json => {
            for ((bar, input), result) in bars.iter().zip(&inputs).zip(&results) {
                let row = EvalRow {
                    timestamp: bar.timestamp,
                    input: *input,
                    result,
                };
                serde_json::to_writer(&mut out, &row)?;
                writeln!(out)?;
            }
        }
    }

    let summary = EvalSummary::from_results(&results);
    tracing::info!(
        ready = summary.ready,
        warmup = summary.not_ready,
        errors = summary.errors,
        "Evaluation complete"
    );
    Ok(())
}

fn run_features(config_path: PathBuf, store_dir: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = ModelConfig::from_file(&config_path)?;
    let store = SeriesStore::new(store_dir);
    tracing::info!(
        config = %config_path.display(),
        store = %store.root().display(),
        columns = config.indicators.len(),
        "Building features"
    );

    for key in config.raw_inputs() {
        if !store.contains(&key) {
            tracing::warn!(
                series = %key,
                path = %store.path_for(&key).display(),
                "Series missing from store; import it with `ta data import`"
            );
        }
    }

    let table = build_features(&config, &store)?;
    match out {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Cannot create {}", path.display()))?;
            table.write_csv(file)?;
            tracing::info!(path = %path.display(), rows = table.len(), "Feature table written");
        }
        None => table.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

fn import_data(file: PathBuf, key: SeriesKey, store_dir: PathBuf) -> Result<()> {
    tracing::info!(file = %file.display(), series = %key, "Importing CSV data");

    let bars = csv_loader::load_bars_from_csv(&file)?;
    let store = SeriesStore::new(store_dir);
    let path = store.store(&key, &bars)?;

    println!("Imported {} bars for {} into {}", bars.len(), key, path.display());
    Ok(())
}

fn parse_param(s: &str) -> Result<(String, ParamValue), String> {
    Params::parse_assignment(s).ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// `key=value` pairs joined by commas, for logging.
fn describe_params(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    match s.to_ascii_lowercase().as_str() {
        "one_minute" | "1m" => Ok(Resolution::OneMinute),
        "five_minutes" | "5m" => Ok(Resolution::FiveMinutes),
        "ten_minutes" | "10m" => Ok(Resolution::TenMinutes),
        "thirty_minutes" | "30m" => Ok(Resolution::ThirtyMinutes),
        "one_hour" | "1h" => Ok(Resolution::OneHour),
        "one_day" | "1d" => Ok(Resolution::OneDay),
        other => Err(format!("unknown resolution '{other}'")),
    }
}
