//! Fixed allocation weights.

use crate::types::Asset;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Validated asset allocation for a buy-and-hold portfolio.
///
/// Weights are non-negative, finite, keyed by unique assets, and sum to 1.0
/// within [`WEIGHT_SUM_TOLERANCE`]. Entry order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    entries: Vec<(Asset, f64)>,
}

impl WeightVector {
    /// Build a weight vector from `(asset, weight)` pairs.
    ///
    /// Fails with [`Error::InvalidParameter`] on a negative or non-finite weight and
    /// with [`Error::WeightMismatch`] on a duplicated asset or a sum outside tolerance.
    pub fn new<I, A>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<Asset>,
    {
        let entries: Vec<(Asset, f64)> = entries
            .into_iter()
            .map(|(asset, weight)| (asset.into(), weight))
            .collect();

        let mut seen = BTreeSet::new();
        for (asset, weight) in &entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "Weight for {} must be a finite non-negative number, got {}",
                    asset, weight
                )));
            }
            if !seen.insert(asset.clone()) {
                return Err(Error::WeightMismatch(format!(
                    "Asset {} appears more than once",
                    asset
                )));
            }
        }

        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::WeightMismatch(format!(
                "Weights must sum to 1.0, got {}",
                total
            )));
        }

        Ok(Self { entries })
    }

    /// Assets in configuration order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.entries.iter().map(|(asset, _)| asset)
    }

    /// All `(asset, weight)` pairs in configuration order.
    pub fn entries(&self) -> &[(Asset, f64)] {
        &self.entries
    }

    /// Weight assigned to an asset, if it is part of the allocation.
    pub fn weight(&self, asset: &Asset) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that this allocation covers exactly the given asset set.
    pub fn ensure_matches<'a>(&self, assets: impl IntoIterator<Item = &'a Asset>) -> Result<()> {
        let expected: BTreeSet<&Asset> = self.assets().collect();
        let actual: BTreeSet<&Asset> = assets.into_iter().collect();

        if expected == actual {
            return Ok(());
        }

        let missing: Vec<&str> = actual.difference(&expected).map(|a| a.as_str()).collect();
        let extra: Vec<&str> = expected.difference(&actual).map(|a| a.as_str()).collect();
        Err(Error::WeightMismatch(format!(
            "Weight assets differ from return assets (unweighted: {:?}, without data: {:?})",
            missing, extra
        )))
    }
}
