//! Holdfast Core - Risk and return analytics for buy-and-hold portfolios.
//!
//! This crate turns per-asset daily closing prices into portfolio-level statistics
//! for a fixed-weight allocation:
//!
//! - **Price alignment**: Outer-joined price matrix with explicit gaps
//! - **Returns**: Per-asset simple returns and the weighted portfolio return
//! - **Growth**: Compounded cumulative growth and drawdown
//! - **Risk metrics**: Sharpe ratio, Sortino ratio, parametric VaR
//! - **Stress windows**: Slicing growth around named recession periods
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use holdfast_core::{
//!     cumulative_growth, daily_returns, portfolio_returns, PriceMatrix, PriceRow, WeightVector,
//! };
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let rows = vec![
//!     PriceRow::new("SPY", day(2), 100.0),
//!     PriceRow::new("SPY", day(3), 101.0),
//!     PriceRow::new("TLT", day(2), 50.0),
//!     PriceRow::new("TLT", day(3), 49.5),
//! ];
//!
//! let prices = PriceMatrix::build(&rows)?;
//! let weights = WeightVector::new([("SPY", 0.6), ("TLT", 0.4)])?;
//! let returns = portfolio_returns(&daily_returns(&prices), &weights)?;
//! let growth = cumulative_growth(&returns)?;
//!
//! assert_eq!(growth.len(), 1);
//! # Ok::<(), holdfast_core::Error>(())
//! ```

pub mod config;
pub mod growth;
pub mod periods;
pub mod pipeline;
pub mod prices;
pub mod report;
pub mod returns;
pub mod risk;
pub mod source;
pub mod types;
pub mod weights;

// Re-export commonly used types
pub use types::{ApiResponse, Asset, Observation, PriceRow, Series};

// Re-export main functionality
pub use config::{AnalysisConfig, Holding};
pub use growth::{cumulative_growth, max_drawdown, rebase, total_return, GrowthSeries};
pub use periods::{default_recession_periods, segment, slice, PeriodSlice, RecessionPeriod};
pub use pipeline::{load_prices, PortfolioAnalysis};
pub use prices::PriceMatrix;
pub use report::{AnalysisReport, JsonSink, PeriodReport, ReportSink, RiskOutcome};
pub use returns::{daily_returns, portfolio_returns, AssetReturns, ReturnSeries};
pub use risk::{
    annualized_volatility, norm_ppf, sharpe_ratio, sortino_ratio, value_at_risk, RiskParameters,
    RiskSummary, TRADING_DAYS_PER_YEAR,
};
pub use source::{CsvPriceSource, PriceSource};
pub use weights::{WeightVector, WEIGHT_SUM_TOLERANCE};

/// Error types for holdfast-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Weight mismatch: {0}")]
    WeightMismatch(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for holdfast-core operations.
pub type Result<T> = std::result::Result<T, Error>;
