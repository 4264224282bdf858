//! Price data acquisition.
//!
//! The analytics only ever see [`PriceRow`]s; where they come from is behind the
//! [`PriceSource`] trait. [`CsvPriceSource`] reads already-downloaded adjusted
//! closes from disk in either of two layouts:
//!
//! - long: `asset,date,price` (header aliases `ticker`/`symbol` and
//!   `adj_close`/`close` are accepted)
//! - wide: `date,<ASSET>,<ASSET>,...` with one price column per asset
//!
//! An empty cell or `NaN` is a missing price.

use crate::types::{Asset, PriceRow};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Supplies daily adjusted closing prices for a set of assets.
pub trait PriceSource {
    /// Fetch rows for `assets` with dates in `[start, end]`.
    fn fetch(&self, assets: &[Asset], start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRow>>;
}

/// Price source backed by a CSV file.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the file.
    pub fn read_all(&self) -> Result<Vec<PriceRow>> {
        let file = std::fs::File::open(&self.path)?;
        let rows = parse_csv(file)?;
        tracing::debug!("Read {} price rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, assets: &[Asset], start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRow>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|row| assets.contains(&row.asset) && start <= row.date && row.date <= end)
            .collect())
    }
}

/// Parse price rows from CSV text in long or wide layout.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<PriceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let asset_col = find(&["asset", "ticker", "symbol"]);
    let date_col = find(&["date"]);
    let price_col = find(&["price", "adj_close", "adj close", "close"]);

    let Some(date_col) = date_col else {
        return Err(Error::Data("CSV header has no 'date' column".to_string()));
    };

    let mut rows = Vec::new();
    match (asset_col, price_col) {
        (Some(asset_col), Some(price_col)) => {
            for record in rdr.records() {
                let record = record?;
                let line = line_of(&record);
                let asset = field(&record, asset_col, line)?;
                if asset.is_empty() {
                    return Err(Error::Data(format!("Missing asset on line {}", line)));
                }
                let date = parse_date(field(&record, date_col, line)?, line)?;
                let price = parse_price(field(&record, price_col, line)?, line)?;
                rows.push(PriceRow {
                    asset: Asset::new(asset),
                    date,
                    price,
                });
            }
        }
        (None, _) if headers.len() > 1 => {
            let assets: Vec<(usize, Asset)> = rdr
                .headers()?
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != date_col)
                .map(|(idx, name)| (idx, Asset::new(name)))
                .collect();

            for record in rdr.records() {
                let record = record?;
                let line = line_of(&record);
                let date = parse_date(field(&record, date_col, line)?, line)?;
                for (idx, asset) in &assets {
                    rows.push(PriceRow {
                        asset: asset.clone(),
                        date,
                        price: parse_price(field(&record, *idx, line)?, line)?,
                    });
                }
            }
        }
        _ => {
            return Err(Error::Data(
                "CSV header must be 'asset,date,price' or 'date,<asset>,...'".to_string(),
            ))
        }
    }

    Ok(rows)
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn field(record: &csv::StringRecord, idx: usize, line: u64) -> Result<&str> {
    record
        .get(idx)
        .ok_or_else(|| Error::Data(format!("Missing column {} on line {}", idx + 1, line)))
}

fn parse_date(value: &str, line: u64) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::Data(format!("Invalid date '{}' on line {}: {}", value, line, e)))
}

fn parse_price(value: &str, line: u64) -> Result<Option<f64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| Error::Data(format!("Invalid price '{}' on line {}: {}", value, line, e)))
}
