// src/main.rs
mod collector;
mod edinet;
mod extractors;
mod prices;
mod query;
mod server;
mod storage;
mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use collector::{Collector, Window};
use storage::{CompanyRecord, Storage};
use utils::{AppError, Config};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Collect filings submitted on --date
    Run,
    /// Collect every weekday from --from to --to
    Batch,
    /// Parse a local .xbrl or .zip file and print the figures
    TestParse,
    /// Serve the dashboard and JSON API
    Serve,
    /// Fetch price history for every stored entity
    Prices,
}

/// Command Line Interface for the EDINET financial screener
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execution mode
    #[arg(short, long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,

    /// Target submission date for run mode (YYYY-MM-DD)
    #[arg(short, long, default_value = "2025-12-25")]
    date: NaiveDate,

    /// First date of a batch range (inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date of a batch range (inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Local instance document or archive for test-parse
    #[arg(
        short,
        long,
        default_value = "./data/S100WYZE/XBRL/PublicDoc/jpcrp040300-ssr-001_E02144-000_2025-09-30_01_2025-11-13.xbrl"
    )]
    file: PathBuf,

    /// Store the test-parse result under this security code
    #[arg(long)]
    code: Option<String>,

    /// Entity name for a stored test-parse result
    #[arg(long, default_value = "Test Parse")]
    name: String,

    /// Debug mode - log archive entries, contexts and the pattern behind each field (test-parse)
    #[arg(long)]
    debug: bool,

    /// Directory holding the SQLite database
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Listen address for serve mode
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Dashboard assets for serve mode
    #[arg(long, default_value = "./static")]
    static_dir: PathBuf,

    /// Pause before each EDINET request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    request_delay_ms: u64,

    /// Pause between days in batch mode, in milliseconds
    #[arg(long, default_value_t = 2000)]
    day_delay_ms: u64,

    /// Pause between price downloads, in milliseconds
    #[arg(long, default_value_t = 1000)]
    price_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    let default_filter = match args.mode {
        Mode::Serve => utils::logging::SERVER_FILTER,
        _ => utils::logging::DEFAULT_FILTER,
    };
    utils::logging::setup_logging(default_filter);
    tracing::debug!("Starting with args: {:?}", args);

    let config = Config::from_env(
        &args.data_dir,
        Duration::from_millis(args.request_delay_ms),
        Duration::from_millis(args.day_delay_ms),
        Duration::from_millis(args.price_delay_ms),
    );
    config.ensure_data_dir()?;

    // 3. Dispatch
    match args.mode {
        Mode::Run => run_collector(&config, Window::Day(args.date)).await,
        Mode::Batch => {
            let from = args.from.ok_or_else(|| AppError::Config("batch mode needs --from".to_string()))?;
            let to = args.to.unwrap_or(from);
            run_collector(&config, Window::Weekdays { from, to }).await
        }
        Mode::TestParse => test_parse(&config, &args.file, args.code.as_deref(), &args.name, args.debug),
        Mode::Serve => server::serve(&config, &args.addr, &args.static_dir).await,
        Mode::Prices => fetch_prices(&config).await,
    }
}

async fn run_collector(config: &Config, window: Window) -> Result<(), AppError> {
    let source = edinet::source_from_config(config)?;
    let storage = Storage::open(config.db_path())?;
    let summary = Collector::new(source.as_ref(), &storage)
        .collect(window, config.day_delay)
        .await?;

    tracing::info!(
        "All processes completed. Stored {} of {} eligible filings ({} insufficient, {} failed)",
        summary.stored,
        summary.eligible,
        summary.insufficient,
        summary.failed
    );
    Ok(())
}

async fn fetch_prices(config: &Config) -> Result<(), AppError> {
    let today = chrono::Local::now().date_naive();
    let source = prices::source_from_config(config, today)?;
    let mut storage = Storage::open(config.db_path())?;
    prices::run_price_pass(&mut storage, source.as_ref(), config.price_delay, today).await?;
    Ok(())
}

/// Parses a local file, prints the figures as JSON, and optionally stores them.
fn test_parse(config: &Config, file: &Path, code: Option<&str>, name: &str, debug: bool) -> Result<(), AppError> {
    tracing::info!("Parsing local file {}", file.display());
    if debug {
        extractors::inspect_file(file)?.log();
    }
    let figures = extractors::extract_file(file)?;

    let json = serde_json::to_string_pretty(&figures)
        .map_err(|e| AppError::Config(format!("Failed to render figures: {}", e)))?;
    println!("{}", json);

    if let Some(code) = code {
        let code = edinet::entity_code(code)?;
        let storage = Storage::open(config.db_path())?;
        storage.upsert_company(&CompanyRecord::new(&code, name, figures))?;
        tracing::info!("Stored test-parse result as {} ({})", code, name);
    }
    Ok(())
}
