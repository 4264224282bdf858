//! Holdfast CLI - Command line driver for portfolio analytics.
//!
//! Reads downloaded prices from CSV and an allocation from TOML, and prints JSON
//! responses (`{"ok": ..., "data": ..., "error": ...}`) on stdout. Logs go to
//! stderr and are controlled with `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use holdfast_core::{
    load_prices, AnalysisConfig, AnalysisReport, ApiResponse, CsvPriceSource, JsonSink,
    PortfolioAnalysis, ReportSink,
};
use serde::Serialize;
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "holdfast")]
#[command(about = "Holdfast CLI - buy-and-hold portfolio risk and return analytics")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $HOLDFAST_CONFIG or ~/.holdfast/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute returns, growth, risk metrics and recession slices
    Analyze {
        /// CSV file with adjusted closing prices
        #[arg(short, long)]
        prices: PathBuf,
    },
    /// Rebase every asset's prices to a common starting value
    Normalize {
        /// CSV file with adjusted closing prices
        #[arg(short, long)]
        prices: PathBuf,
        /// Starting value of every asset
        #[arg(short, long, default_value = "100")]
        base: f64,
    },
    /// List the configured recession periods
    Periods,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { prices } => handle_analyze(cli.config.as_deref(), &prices),
        Commands::Normalize { prices, base } => {
            handle_normalize(cli.config.as_deref(), &prices, base)
        }
        Commands::Periods => handle_periods(cli.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            print_json(&ApiResponse::<()>::err(format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AnalysisConfig::default_path);
    AnalysisConfig::load_from_path(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

fn run_analysis(config_path: Option<&Path>, prices: &Path) -> Result<PortfolioAnalysis> {
    let config = load_config(config_path)?;
    let source = CsvPriceSource::new(prices);
    PortfolioAnalysis::from_source(&source, &config)
        .with_context(|| format!("Failed to analyze prices from {}", prices.display()))
}

fn handle_analyze(config_path: Option<&Path>, prices: &Path) -> Result<()> {
    let analysis = run_analysis(config_path, prices)?;
    let report = AnalysisReport::from_analysis(&analysis)?;

    let mut sink = JsonSink::new(io::stdout().lock()).with_envelope();
    sink.emit(&report)?;
    Ok(())
}

fn handle_normalize(config_path: Option<&Path>, prices: &Path, base: f64) -> Result<()> {
    anyhow::ensure!(
        base.is_finite() && base > 0.0,
        "Base must be a positive number, got {}",
        base
    );

    let config = load_config(config_path)?;
    let source = CsvPriceSource::new(prices);
    let matrix = load_prices(&source, &config)
        .with_context(|| format!("Failed to load prices from {}", prices.display()))?;
    print_json(&ApiResponse::ok(json!({
        "base": base,
        "prices": matrix.normalize(base),
    })));
    Ok(())
}

fn handle_periods(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print_json(&ApiResponse::ok(json!({
        "recession_periods": config.recession_periods,
    })));
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!("Failed to serialize response: {}", e),
    }
}
