//! Core data types shared across the analytics pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol identifying one asset of a portfolio.
///
/// Symbols are trimmed and uppercased on construction so `"jnj "` and `"JNJ"`
/// name the same asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Asset(String);

impl Asset {
    /// Create an asset from a ticker symbol.
    pub fn new(symbol: &str) -> Self {
        Self(symbol.trim().to_uppercase())
    }

    /// The normalized ticker symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Asset {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for Asset {
    fn from(symbol: String) -> Self {
        Self::new(&symbol)
    }
}

impl From<&Asset> for Asset {
    fn from(asset: &Asset) -> Self {
        asset.clone()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.0
    }
}

impl AsRef<str> for Asset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw observation from a data source: an asset's adjusted close on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Asset the price belongs to
    pub asset: Asset,
    /// Trading date
    pub date: NaiveDate,
    /// Adjusted closing price, `None` when the source reported no value
    pub price: Option<f64>,
}

impl PriceRow {
    /// Create a row carrying a price.
    pub fn new(asset: impl Into<Asset>, date: NaiveDate, price: f64) -> Self {
        Self {
            asset: asset.into(),
            date,
            price: Some(price),
        }
    }

    /// Create a row that explicitly records a missing price.
    pub fn absent(asset: impl Into<Asset>, date: NaiveDate) -> Self {
        Self {
            asset: asset.into(),
            date,
            price: None,
        }
    }
}

/// A dated scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An ordered, date-indexed sequence of scalar values.
///
/// Used for portfolio returns and cumulative growth alike. Points are kept in
/// ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<Observation>,
}

impl Series {
    /// Create a series, ordering the points by date.
    pub fn new(mut points: Vec<Observation>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// Create an empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in date order.
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.points.iter()
    }

    /// Dates of the series, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Values of the series, in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    /// Look up the value recorded on an exact date.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// Consume the series and return its points.
    pub fn into_points(self) -> Vec<Observation> {
        self.points
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// API response wrapper used by the command-line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_asset_normalization() {
        let asset = Asset::new(" jnj ");
        assert_eq!(asset.as_str(), "JNJ");
        assert_eq!(asset, Asset::from("JNJ"));
        assert_eq!(asset.to_string(), "JNJ");
    }

    #[test]
    fn test_asset_serde_normalizes() {
        let asset: Asset = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(asset.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&asset).unwrap(), "\"MSFT\"");
    }

    #[test]
    fn test_price_row_constructors() {
        let row = PriceRow::new("gld", day(1), 180.5);
        assert_eq!(row.asset.as_str(), "GLD");
        assert_eq!(row.price, Some(180.5));

        let gap = PriceRow::absent("GLD", day(2));
        assert!(gap.price.is_none());
    }

    #[test]
    fn test_series_orders_points() {
        let series = Series::new(vec![
            Observation::new(day(3), 0.3),
            Observation::new(day(1), 0.1),
            Observation::new(day(2), 0.2),
        ]);

        assert_eq!(series.dates(), vec![day(1), day(2), day(3)]);
        assert_eq!(series.values(), vec![0.1, 0.2, 0.3]);
        assert_eq!(series.value_on(day(2)), Some(0.2));
        assert_eq!(series.value_on(day(4)), None);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
