//! Aligned per-asset price observations.

use crate::types::{Asset, PriceRow};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Daily prices of several assets on a shared, ascending date axis.
///
/// The date axis is the union of every date present in the source rows. An asset
/// with no price on one of those dates holds an explicit gap (`None`); gaps are
/// never filled with zero or carried forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<Asset>,
    /// One column per asset, each aligned with `dates`
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Build a matrix from raw source rows.
    ///
    /// Assets keep the order in which they first appear. Fails with
    /// [`Error::Data`] when there are no rows, a price is not a finite positive
    /// number, an `(asset, date)` pair repeats, or an asset has no valid price.
    pub fn build(rows: &[PriceRow]) -> Result<Self> {
        let mut order: Vec<Asset> = Vec::new();
        for row in rows {
            if !order.contains(&row.asset) {
                order.push(row.asset.clone());
            }
        }
        Self::from_rows(rows.iter(), order)
    }

    /// Build a matrix for a configured asset list, optionally limited to an
    /// inclusive date window.
    ///
    /// Rows for other assets or outside the window are ignored. Every configured
    /// asset must have at least one valid price inside the window.
    pub fn build_for(
        rows: &[PriceRow],
        assets: &[Asset],
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Self> {
        if let Some((start, end)) = window {
            if end < start {
                return Err(Error::InvalidParameter(format!(
                    "Analysis window ends ({}) before it starts ({})",
                    end, start
                )));
            }
        }

        let wanted: BTreeSet<&Asset> = assets.iter().collect();
        if wanted.len() != assets.len() {
            return Err(Error::InvalidParameter(
                "Configured asset list contains duplicates".to_string(),
            ));
        }

        let in_window = |date: NaiveDate| match window {
            Some((start, end)) => start <= date && date <= end,
            None => true,
        };

        let selected: Vec<&PriceRow> = rows
            .iter()
            .filter(|row| wanted.contains(&row.asset) && in_window(row.date))
            .collect();

        let ignored = rows.len() - selected.len();
        if ignored > 0 {
            tracing::debug!(
                "Ignored {} price rows outside the configured assets or window",
                ignored
            );
        }

        Self::from_rows(selected.into_iter(), assets.to_vec())
    }

    fn from_rows<'a>(rows: impl Iterator<Item = &'a PriceRow>, assets: Vec<Asset>) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::Data("No assets to build a price matrix for".to_string()));
        }

        let index: HashMap<&Asset, usize> = assets.iter().enumerate().map(|(i, a)| (a, i)).collect();
        let mut cells: BTreeMap<NaiveDate, Vec<Option<Option<f64>>>> = BTreeMap::new();
        let mut row_count = 0usize;

        for row in rows {
            row_count += 1;
            let Some(&col) = index.get(&row.asset) else {
                continue;
            };

            if let Some(price) = row.price {
                if !price.is_finite() || price <= 0.0 {
                    return Err(Error::Data(format!(
                        "Invalid price {} for {} on {}",
                        price, row.asset, row.date
                    )));
                }
            }

            let slots = cells
                .entry(row.date)
                .or_insert_with(|| vec![None; assets.len()]);
            if slots[col].is_some() {
                return Err(Error::Data(format!(
                    "Duplicate price for {} on {}",
                    row.asset, row.date
                )));
            }
            slots[col] = Some(row.price);
        }

        if row_count == 0 {
            return Err(Error::Data("No price rows supplied".to_string()));
        }

        let dates: Vec<NaiveDate> = cells.keys().copied().collect();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(dates.len()); assets.len()];
        for slots in cells.values() {
            for (col, slot) in slots.iter().enumerate() {
                columns[col].push((*slot).flatten());
            }
        }

        for (asset, column) in assets.iter().zip(&columns) {
            if column.iter().all(Option::is_none) {
                return Err(Error::Data(format!("No valid prices for {}", asset)));
            }
        }

        Ok(Self {
            dates,
            assets,
            columns,
        })
    }

    /// Rescale every asset so its first available price equals `base`.
    ///
    /// Presentation only: metrics are always computed from the raw prices.
    pub fn normalize(&self, base: f64) -> Self {
        let columns: Vec<Vec<Option<f64>>> = self
            .columns
            .iter()
            .map(|column| {
                let first = column.iter().flatten().next().copied();
                column
                    .iter()
                    .map(|price| match (price, first) {
                        (Some(p), Some(f)) => Some(p / f * base),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self {
            dates: self.dates.clone(),
            assets: self.assets.clone(),
            columns,
        }
    }

    /// Shared date axis, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Number of dates on the axis.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Prices of one asset aligned with [`dates`](Self::dates).
    pub fn column(&self, asset: &Asset) -> Option<&[Option<f64>]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Price of an asset at a position on the date axis.
    pub fn price(&self, asset: &Asset, index: usize) -> Option<f64> {
        self.column(asset)
            .and_then(|column| column.get(index).copied().flatten())
    }

    /// Iterate `(asset, column)` pairs in asset order.
    pub fn columns(&self) -> impl Iterator<Item = (&Asset, &[Option<f64>])> {
        self.assets
            .iter()
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, d).unwrap()
    }

    fn sample_rows() -> Vec<PriceRow> {
        vec![
            PriceRow::new("A", day(3), 100.0),
            PriceRow::new("A", day(4), 110.0),
            PriceRow::new("A", day(5), 121.0),
            PriceRow::new("B", day(3), 50.0),
            PriceRow::new("B", day(5), 40.0),
        ]
    }

    #[test]
    fn test_build_outer_joins_dates() {
        let matrix = PriceMatrix::build(&sample_rows()).unwrap();

        assert_eq!(matrix.dates(), &[day(3), day(4), day(5)]);
        assert_eq!(matrix.assets(), &[Asset::new("A"), Asset::new("B")]);
        assert_eq!(
            matrix.column(&Asset::new("B")).unwrap(),
            &[Some(50.0), None, Some(40.0)]
        );
        assert_eq!(matrix.price(&Asset::new("A"), 1), Some(110.0));
        assert_eq!(matrix.price(&Asset::new("B"), 1), None);
    }

    #[test]
    fn test_build_sorts_dates() {
        let rows = vec![
            PriceRow::new("A", day(5), 3.0),
            PriceRow::new("A", day(3), 1.0),
            PriceRow::new("A", day(4), 2.0),
        ];
        let matrix = PriceMatrix::build(&rows).unwrap();

        assert_eq!(matrix.first_date(), Some(day(3)));
        assert_eq!(matrix.last_date(), Some(day(5)));
        assert_eq!(
            matrix.column(&Asset::new("A")).unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_build_empty_rows() {
        let result = PriceMatrix::build(&[]);
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn test_build_asset_without_prices() {
        let rows = vec![
            PriceRow::new("A", day(3), 100.0),
            PriceRow::absent("B", day(3)),
        ];
        let result = PriceMatrix::build(&rows);
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn test_build_rejects_bad_prices() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let rows = vec![PriceRow::new("A", day(3), bad)];
            assert!(matches!(PriceMatrix::build(&rows), Err(Error::Data(_))));
        }
    }

    #[test]
    fn test_build_rejects_duplicates() {
        let rows = vec![
            PriceRow::new("A", day(3), 100.0),
            PriceRow::new("a", day(3), 101.0),
        ];
        assert!(matches!(PriceMatrix::build(&rows), Err(Error::Data(_))));
    }

    #[test]
    fn test_build_for_window_and_assets() {
        let mut rows = sample_rows();
        rows.push(PriceRow::new("C", day(4), 10.0));

        let assets = vec![Asset::new("B"), Asset::new("A")];
        let matrix = PriceMatrix::build_for(&rows, &assets, Some((day(4), day(5)))).unwrap();

        assert_eq!(matrix.assets(), assets.as_slice());
        assert_eq!(matrix.dates(), &[day(4), day(5)]);
        assert_eq!(
            matrix.column(&Asset::new("B")).unwrap(),
            &[None, Some(40.0)]
        );
    }

    #[test]
    fn test_build_for_missing_configured_asset() {
        let assets = vec![Asset::new("A"), Asset::new("Z")];
        let result = PriceMatrix::build_for(&sample_rows(), &assets, None);
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn test_build_for_asset_empty_in_window() {
        let assets = vec![Asset::new("A"), Asset::new("B")];
        let result = PriceMatrix::build_for(&sample_rows(), &assets, Some((day(4), day(4))));
        assert!(matches!(result, Err(Error::Data(_))));
    }

    #[test]
    fn test_build_for_inverted_window() {
        let assets = vec![Asset::new("A")];
        let result = PriceMatrix::build_for(&sample_rows(), &assets, Some((day(5), day(3))));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_normalize() {
        let rows = vec![
            PriceRow::absent("A", day(3)),
            PriceRow::new("A", day(4), 200.0),
            PriceRow::new("A", day(5), 250.0),
            PriceRow::new("B", day(3), 20.0),
            PriceRow::new("B", day(4), 10.0),
        ];
        let matrix = PriceMatrix::build(&rows).unwrap();
        let normalized = matrix.normalize(100.0);

        let a = normalized.column(&Asset::new("A")).unwrap();
        assert_eq!(a[0], None);
        assert_relative_eq!(a[1].unwrap(), 100.0);
        assert_relative_eq!(a[2].unwrap(), 125.0);

        let b = normalized.column(&Asset::new("B")).unwrap();
        assert_relative_eq!(b[0].unwrap(), 100.0);
        assert_relative_eq!(b[1].unwrap(), 50.0);
        assert_eq!(b[2], None);

        // Source matrix is untouched
        assert_eq!(matrix.price(&Asset::new("A"), 1), Some(200.0));
    }
}
