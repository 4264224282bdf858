//! Daily return calculation.
//!
//! Per-asset returns are simple period-over-period changes. The portfolio return
//! on a date is the weighted sum of asset returns and exists only when every asset
//! has a return on that date. Dates where any asset has a gap are dropped from the
//! portfolio series rather than imputed.

use crate::prices::PriceMatrix;
use crate::types::{Asset, Observation, Series};
use crate::weights::WeightVector;
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;

/// A date-indexed series of portfolio returns.
pub type ReturnSeries = Series;

/// Per-asset daily returns on a shared date axis.
///
/// The axis is the price axis without its first date. A return is `None` when the
/// price on either end of the interval is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReturns {
    dates: Vec<NaiveDate>,
    assets: Vec<Asset>,
    columns: Vec<Vec<Option<f64>>>,
}

impl AssetReturns {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns of one asset aligned with [`dates`](Self::dates).
    pub fn column(&self, asset: &Asset) -> Option<&[Option<f64>]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Dated returns of one asset, gaps included.
    pub fn series(&self, asset: &Asset) -> Option<Vec<(NaiveDate, Option<f64>)>> {
        self.column(asset)
            .map(|column| self.dates.iter().copied().zip(column.iter().copied()).collect())
    }
}

/// Calculate simple daily returns for every asset of a price matrix.
///
/// `r_t = p_t / p_{t-1} - 1`, with `None` wherever either price is absent.
pub fn daily_returns(prices: &PriceMatrix) -> AssetReturns {
    let dates: Vec<NaiveDate> = prices.dates().iter().skip(1).copied().collect();

    let (assets, columns): (Vec<Asset>, Vec<Vec<Option<f64>>>) = prices
        .columns()
        .map(|(asset, column)| {
            let returns = column
                .windows(2)
                .map(|pair| match (pair[0], pair[1]) {
                    (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
                    _ => None,
                })
                .collect::<Vec<_>>();
            (asset.clone(), returns)
        })
        .unzip();

    AssetReturns {
        dates,
        assets,
        columns,
    }
}

/// Combine per-asset returns into the fixed-weight portfolio return series.
///
/// Only dates on which every asset has a defined return are kept (inner join).
/// Fails with [`Error::WeightMismatch`](crate::Error::WeightMismatch) when the
/// weighted assets differ from the assets of `asset_returns`.
pub fn portfolio_returns(asset_returns: &AssetReturns, weights: &WeightVector) -> Result<ReturnSeries> {
    weights.ensure_matches(asset_returns.assets())?;

    let asset_weights: Vec<f64> = asset_returns
        .assets()
        .iter()
        .map(|asset| weights.weight(asset).unwrap_or(0.0))
        .collect();

    let mut points = Vec::with_capacity(asset_returns.len());
    for (idx, &date) in asset_returns.dates().iter().enumerate() {
        let mut total = 0.0;
        let mut complete = true;
        for (column, weight) in asset_returns.columns.iter().zip(&asset_weights) {
            match column[idx] {
                Some(r) => total += weight * r,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            points.push(Observation::new(date, total));
        }
    }

    let dropped = asset_returns.len() - points.len();
    if dropped > 0 {
        tracing::debug!(
            "Dropped {} of {} dates with an incomplete set of asset returns",
            dropped,
            asset_returns.len()
        );
    }

    Ok(Series::new(points))
}
