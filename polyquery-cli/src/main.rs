//! PolyQuery CLI: fetch Polygon aggregate bars and export them as CSV.
//!
//! Commands:
//! - `fetch`: retrieve bars for one or more tickers and write combined or per-ticker CSV files
//! - `tickers`: print sample tickers and the Polygon prefix rules

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use polyquery_core::config::AppConfig;
use polyquery_core::data::{
    build_artifacts, combine, fetch_all, save_artifacts, ExportError, ExportMode, FetchPlan,
    PolygonClient, RequestBuilder, StdoutProgress,
};
use polyquery_core::domain::BarUnit;
use polyquery_core::logging::{init_logging, LogConfig};
use polyquery_core::symbols::{reference_tickers, AssetClass, InstrumentList};
use secrecy::SecretString;
use std::path::PathBuf;

const NO_DATA_MESSAGE: &str = "No valid data fetched. Check your tickers or date range.";

#[derive(Parser)]
#[command(
    name = "polyquery",
    version,
    about = "PolyQuery: Polygon.io aggregate bars to CSV"
)]
struct Cli {
    /// Log diagnostics at info level (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch aggregate bars and export them as CSV.
    Fetch(FetchArgs),
    /// Print sample tickers and prefix rules.
    Tickers,
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Comma-separated tickers (e.g., "AAPL,MSFT" or "X:BTCUSD,X:ETHUSD").
    #[arg(long)]
    symbols: Option<String>,

    /// CSV file with a `ticker` column.
    #[arg(long)]
    tickers_file: Option<PathBuf>,

    /// Bar size multiplier. Defaults to the config value (1).
    #[arg(long)]
    multiplier: Option<u32>,

    /// Bar unit: minute, hour, day, week or month. Defaults to the config value (day).
    #[arg(long)]
    unit: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Write one CSV per ticker instead of a single combined file.
    #[arg(long, default_value_t = false)]
    separate: bool,

    /// Output directory. Defaults to the config value (./downloads).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long, env = "POLYQUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Polygon API key. Defaults to the environment variable named in the config.
    #[arg(long)]
    api_key: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_default_level("info");
    }
    init_logging(log_config)?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(args),
        Commands::Tickers => {
            run_tickers();
            Ok(())
        }
    }
}

fn run_fetch(args: FetchArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    let instruments = match (&args.symbols, &args.tickers_file) {
        (Some(_), Some(_)) => bail!("--symbols and --tickers-file are mutually exclusive"),
        (Some(text), None) => InstrumentList::from_text(text),
        (None, Some(path)) => InstrumentList::from_csv_path(path)?,
        (None, None) => bail!("one of --symbols or --tickers-file is required"),
    };
    if instruments.is_empty() {
        bail!("no tickers given");
    }

    let api_key = match args.api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None => match config.api_key_from_env() {
            Some(key) => key,
            None => bail!(
                "a Polygon API key is required: pass --api-key or set {}",
                config.api.api_key_env
            ),
        },
    };

    let today = chrono::Local::now().date_naive();
    let start_date = parse_date(args.start.as_deref())?.unwrap_or(today);
    let end_date = parse_date(args.end.as_deref())?.unwrap_or(today);

    let bar_unit = match args.unit.as_deref() {
        Some(unit) => unit.parse::<BarUnit>()?,
        None => config.fetch.unit,
    };
    let mode = if args.separate {
        ExportMode::Separate
    } else {
        config.fetch.mode
    };
    let output_dir = args.output_dir.unwrap_or_else(|| config.output.dir.clone());

    let plan = FetchPlan {
        instruments,
        bar_multiplier: args.multiplier.unwrap_or(config.fetch.multiplier),
        bar_unit,
        start_date,
        end_date,
        credential: SecretString::new(api_key.into()),
    };

    let builder = RequestBuilder::new(&config.api.base_url)?;
    let client = PolygonClient::new(config.api.timeout()).context("failed to build HTTP client")?;

    let report = fetch_all(&client, &builder, &plan, &StdoutProgress)?;
    let aggregated = combine(report.into_datasets(), mode)?;

    let artifacts = match build_artifacts(&aggregated) {
        Ok(artifacts) => artifacts,
        Err(ExportError::NothingToExport) => {
            eprintln!("{NO_DATA_MESSAGE}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let paths = save_artifacts(&artifacts, &output_dir)?;
    println!();
    for (artifact, path) in artifacts.iter().zip(&paths) {
        println!(
            "Saved {} ({} rows, blake3 {})",
            path.display(),
            artifact.rows,
            &artifact.digest()[..16]
        );
    }

    Ok(())
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
    })
    .transpose()
}

fn run_tickers() {
    println!("Sample tickers you can pass to --symbols:");
    for class in [AssetClass::Stock, AssetClass::Crypto, AssetClass::Forex] {
        println!();
        println!("{}", class.label());
        for (symbol, name) in reference_tickers(class) {
            println!("  {symbol:<10} {name}");
        }
    }

    println!();
    println!("Polygon prefixes:");
    for class in [AssetClass::Stock, AssetClass::Crypto, AssetClass::Forex] {
        println!("  {:<11} {}", class.label(), class.prefix_hint());
    }
}
