//! End-to-end analysis run.
//!
//! prices -> returns -> {growth, risk}; growth -> period slices. Each run is a
//! pure function of the price rows and the config.

use crate::config::AnalysisConfig;
use crate::growth::{cumulative_growth, max_drawdown, total_return, GrowthSeries};
use crate::periods::{segment, PeriodSlice};
use crate::prices::PriceMatrix;
use crate::returns::{daily_returns, portfolio_returns, AssetReturns, ReturnSeries};
use crate::risk::{annualized_volatility, RiskParameters, RiskSummary};
use crate::source::PriceSource;
use crate::types::PriceRow;
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// Every series derived from one set of prices under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioAnalysis {
    /// Aligned raw prices
    pub prices: PriceMatrix,
    /// Per-asset daily returns, gaps included
    pub asset_returns: AssetReturns,
    /// Fixed-weight portfolio returns on complete dates only
    pub returns: ReturnSeries,
    /// Cumulative growth of the portfolio
    pub growth: GrowthSeries,
    /// Growth restricted to each configured recession period
    pub periods: Vec<PeriodSlice>,
    /// Parameters for the risk statistics
    pub risk_parameters: RiskParameters,
}

impl PortfolioAnalysis {
    /// Run the pipeline over already-fetched price rows.
    pub fn run(rows: &[PriceRow], config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let weights = config.weights()?;
        let risk_parameters = config.risk_parameters()?;

        let prices = PriceMatrix::build_for(rows, &config.assets(), config.window())?;
        tracing::debug!(
            "Aligned {} assets over {} dates",
            prices.assets().len(),
            prices.len()
        );

        let asset_returns = daily_returns(&prices);
        let returns = portfolio_returns(&asset_returns, &weights)?;
        let growth = cumulative_growth(&returns)?;
        let periods = segment(&growth, &config.recession_periods);

        tracing::info!(
            "Analyzed {} assets: {} portfolio returns from {} to {}",
            weights.len(),
            returns.len(),
            growth.first().map(|o| o.date.to_string()).unwrap_or_default(),
            growth.last().map(|o| o.date.to_string()).unwrap_or_default()
        );

        Ok(Self {
            prices,
            asset_returns,
            returns,
            growth,
            periods,
            risk_parameters,
        })
    }

    /// Fetch prices for the configured assets and window, then run the pipeline.
    pub fn from_source(source: &impl PriceSource, config: &AnalysisConfig) -> Result<Self> {
        let rows = fetch_rows(source, config)?;
        Self::run(&rows, config)
    }

    /// Sharpe, Sortino and VaR of the portfolio returns.
    pub fn risk_summary(&self) -> Result<RiskSummary> {
        RiskSummary::compute(&self.returns, &self.risk_parameters)
    }

    pub fn total_return(&self) -> Result<f64> {
        total_return(&self.growth)
    }

    pub fn max_drawdown(&self) -> Result<f64> {
        max_drawdown(&self.growth)
    }

    pub fn annualized_volatility(&self) -> Result<f64> {
        annualized_volatility(&self.returns)
    }

    /// Prices rebased to `base` for charting.
    pub fn normalized_prices(&self, base: f64) -> PriceMatrix {
        self.prices.normalize(base)
    }
}

/// Fetch and align prices for the configured assets and window without
/// deriving returns.
///
/// Dates where some asset has no price are kept, so this succeeds on price
/// files too short or too sparse for a portfolio return.
pub fn load_prices(source: &impl PriceSource, config: &AnalysisConfig) -> Result<PriceMatrix> {
    let rows = fetch_rows(source, config)?;
    PriceMatrix::build_for(&rows, &config.assets(), config.window())
}

fn fetch_rows(source: &impl PriceSource, config: &AnalysisConfig) -> Result<Vec<PriceRow>> {
    config.validate()?;
    let (start, end) = config.window().unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
    source.fetch(&config.assets(), start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::RecessionPeriod;
    use crate::types::Asset;
    use crate::Error;
    use approx::assert_relative_eq;
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rows_from(start: NaiveDate, series: &[(&str, Vec<f64>)]) -> Vec<PriceRow> {
        let mut rows = Vec::new();
        for (asset, prices) in series {
            for (i, &price) in prices.iter().enumerate() {
                rows.push(PriceRow::new(*asset, start + Days::new(i as u64), price));
            }
        }
        rows
    }

    fn mixed_rows() -> Vec<PriceRow> {
        rows_from(
            date(2020, 1, 28),
            &[
                ("STK", vec![100.0, 102.0, 99.0, 101.0, 97.0, 98.5, 100.5, 96.0]),
                ("BND", vec![50.0, 50.1, 50.3, 50.2, 50.6, 50.5, 50.4, 50.9]),
            ],
        )
    }

    #[test]
    fn test_offsetting_assets_scenario() {
        let rows = rows_from(
            date(2021, 3, 1),
            &[("A", vec![100.0, 110.0, 121.0]), ("B", vec![100.0, 90.0, 81.0])],
        );
        let config = AnalysisConfig::with_holdings([("A", 0.5), ("B", 0.5)]);
        let analysis = PortfolioAnalysis::run(&rows, &config).unwrap();

        assert_eq!(analysis.returns.len(), 2);
        for value in analysis.returns.values() {
            assert_relative_eq!(value, 0.0, epsilon = 1e-12);
        }
        for value in analysis.growth.values() {
            assert_relative_eq!(value, 1.0, epsilon = 1e-12);
        }
        assert!(matches!(
            analysis.risk_summary(),
            Err(Error::DegenerateDistribution(_))
        ));
    }

    #[test]
    fn test_growth_aligned_with_returns() {
        let config = AnalysisConfig::with_holdings([("STK", 0.6), ("BND", 0.4)]);
        let analysis = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();

        assert_eq!(analysis.growth.len(), analysis.returns.len());
        assert_eq!(analysis.growth.dates(), analysis.returns.dates());
        assert_relative_eq!(
            analysis.growth.values()[0],
            1.0 + analysis.returns.values()[0]
        );

        let summary = analysis.risk_summary().unwrap();
        assert!(summary.value_at_risk >= 0.0);
        assert_eq!(summary.observations, 7);
    }

    #[test]
    fn test_gap_drops_portfolio_date() {
        let mut rows = mixed_rows();
        let gap_date = date(2020, 1, 30);
        for row in rows.iter_mut() {
            if row.asset == Asset::new("BND") && row.date == gap_date {
                row.price = None;
            }
        }
        let config = AnalysisConfig::with_holdings([("STK", 0.6), ("BND", 0.4)]);
        let analysis = PortfolioAnalysis::run(&rows, &config).unwrap();

        // Returns into and out of the gap are both undefined
        assert_eq!(analysis.returns.len(), 5);
        assert!(analysis.returns.value_on(gap_date).is_none());
        assert!(analysis.returns.value_on(date(2020, 1, 31)).is_none());
    }

    #[test]
    fn test_window_and_periods() {
        let mut config = AnalysisConfig::with_holdings([("STK", 0.6), ("BND", 0.4)])
            .with_window(date(2020, 1, 29), date(2020, 2, 4));
        config.recession_periods = vec![
            RecessionPeriod::new("Early", date(2020, 1, 30), date(2020, 2, 1)).unwrap(),
            RecessionPeriod::new("Later", date(2021, 1, 1), date(2021, 2, 1)).unwrap(),
        ];
        let analysis = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();

        assert_eq!(analysis.prices.first_date(), Some(date(2020, 1, 29)));
        assert_eq!(analysis.prices.last_date(), Some(date(2020, 2, 4)));
        assert_eq!(analysis.returns.len(), 6);

        assert_eq!(analysis.periods.len(), 2);
        assert_eq!(analysis.periods[0].growth.len(), 3);
        assert_eq!(
            analysis.periods[0].growth.values()[0],
            analysis.growth.value_on(date(2020, 1, 30)).unwrap()
        );
        assert!(analysis.periods[1].is_empty());
    }

    #[test]
    fn test_missing_configured_asset() {
        let config = AnalysisConfig::with_holdings([("STK", 0.5), ("GLD", 0.5)]);
        let result = PortfolioAnalysis::run(&mixed_rows(), &config);
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn test_no_complete_dates() {
        let rows = rows_from(date(2020, 1, 1), &[("A", vec![1.0, 1.1])]);
        let config = AnalysisConfig::with_holdings([("A", 1.0)])
            .with_window(date(2020, 1, 1), date(2020, 1, 1));
        let result = PortfolioAnalysis::run(&rows, &config);
        assert!(matches!(result, Err(Error::EmptyInput(_))));
    }

    #[test]
    fn test_run_is_deterministic() {
        let config = AnalysisConfig::with_holdings([("STK", 0.7), ("BND", 0.3)]);
        let first = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();
        let second = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.risk_summary().unwrap(),
            second.risk_summary().unwrap()
        );
    }

    #[test]
    fn test_normalized_prices() {
        let config = AnalysisConfig::with_holdings([("STK", 0.5), ("BND", 0.5)]);
        let analysis = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();
        let normalized = analysis.normalized_prices(100.0);

        assert_relative_eq!(normalized.price(&Asset::new("STK"), 0).unwrap(), 100.0);
        assert_relative_eq!(
            normalized.price(&Asset::new("BND"), 7).unwrap(),
            101.8,
            epsilon = 1e-9
        );
    }

    struct StaticSource(Vec<PriceRow>);

    impl PriceSource for StaticSource {
        fn fetch(
            &self,
            assets: &[Asset],
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<PriceRow>> {
            Ok(self
                .0
                .iter()
                .filter(|r| assets.contains(&r.asset) && start <= r.date && r.date <= end)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_from_source() {
        let source = StaticSource(mixed_rows());
        let config = AnalysisConfig::with_holdings([("STK", 0.6), ("BND", 0.4)]);

        let from_source = PortfolioAnalysis::from_source(&source, &config).unwrap();
        let direct = PortfolioAnalysis::run(&mixed_rows(), &config).unwrap();
        assert_eq!(from_source, direct);
    }

    #[test]
    fn test_load_prices_without_complete_returns() {
        // A single shared date gives no returns, so the full run fails
        let source = StaticSource(rows_from(
            date(2020, 3, 2),
            &[("STK", vec![100.0]), ("BND", vec![50.0])],
        ));
        let config = AnalysisConfig::with_holdings([("STK", 0.5), ("BND", 0.5)]);
        assert!(matches!(
            PortfolioAnalysis::from_source(&source, &config),
            Err(Error::EmptyInput(_))
        ));

        let prices = load_prices(&source, &config).unwrap();
        assert_eq!(prices.len(), 1);
        let normalized = prices.normalize(100.0);
        assert_relative_eq!(normalized.price(&Asset::new("STK"), 0).unwrap(), 100.0);
        assert_relative_eq!(normalized.price(&Asset::new("BND"), 0).unwrap(), 100.0);
    }

    #[test]
    fn test_load_prices_matches_analysis() {
        let source = StaticSource(mixed_rows());
        let config = AnalysisConfig::with_holdings([("STK", 0.6), ("BND", 0.4)])
            .with_window(date(2020, 1, 29), date(2020, 2, 3));

        let prices = load_prices(&source, &config).unwrap();
        let analysis = PortfolioAnalysis::from_source(&source, &config).unwrap();
        assert_eq!(prices, analysis.prices);
    }
}
