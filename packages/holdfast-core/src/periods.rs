//! Named stress windows and date-range slicing.
//!
//! Slices are pure filters over an existing series. A slice of cumulative growth
//! keeps the values computed over the full history and is not re-anchored to 1.0
//! at the start of the window; use [`PeriodSlice::rebased`] for the
//! "growth within the period" view.

use crate::growth::{rebase, GrowthSeries};
use crate::types::Series;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recession windows from the 2000-2020 study period.
const DEFAULT_RECESSION_PERIODS: [(&str, &str, &str); 3] = [
    ("Dot-com Bubble", "2000-03-01", "2002-10-01"),
    ("Global Financial Crisis", "2007-12-01", "2009-06-01"),
    ("COVID-19 Recession", "2020-02-01", "2020-04-01"),
];

/// A named historical date range, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionPeriod {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RecessionPeriod {
    /// Create a period; fails with [`Error::InvalidParameter`] if `end < start`.
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let period = Self {
            name: name.into(),
            start,
            end,
        };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(Error::InvalidParameter(format!(
                "Period '{}' ends ({}) before it starts ({})",
                self.name, self.end, self.start
            )));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The growth series of a portfolio restricted to one named period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSlice {
    pub period: RecessionPeriod,
    /// Full-history cumulative growth values falling inside the period
    pub growth: GrowthSeries,
}

impl PeriodSlice {
    pub fn is_empty(&self) -> bool {
        self.growth.is_empty()
    }

    /// Growth within the period, re-anchored so the first observation is 1.0.
    pub fn rebased(&self) -> Result<GrowthSeries> {
        rebase(&self.growth, None)
    }
}

/// The built-in catalogue: Dot-com Bubble, Global Financial Crisis, COVID-19.
pub fn default_recession_periods() -> Vec<RecessionPeriod> {
    DEFAULT_RECESSION_PERIODS
        .iter()
        .filter_map(|(name, start, end)| {
            Some(RecessionPeriod {
                name: name.to_string(),
                start: start.parse().ok()?,
                end: end.parse().ok()?,
            })
        })
        .collect()
}

/// Restrict a series to the inclusive range `[start, end]`.
///
/// Returns an empty series when no observation falls in range, including when
/// `start > end`.
pub fn slice(series: &Series, start: NaiveDate, end: NaiveDate) -> Series {
    let points = series.points();
    let lo = points.partition_point(|p| p.date < start);
    let hi = points.partition_point(|p| p.date <= end);

    if lo >= hi {
        return Series::empty();
    }
    Series::new(points[lo..hi].to_vec())
}

/// Slice a growth series by every period of a catalogue, in catalogue order.
pub fn segment(growth: &GrowthSeries, periods: &[RecessionPeriod]) -> Vec<PeriodSlice> {
    periods
        .iter()
        .map(|period| {
            let growth = slice(growth, period.start, period.end);
            if growth.is_empty() {
                tracing::debug!("No observations inside period '{}'", period.name);
            }
            PeriodSlice {
                period: period.clone(),
                growth,
            }
        })
        .collect()
}
