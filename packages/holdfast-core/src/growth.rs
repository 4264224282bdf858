//! Cumulative growth of a return series.

use crate::returns::ReturnSeries;
use crate::types::{Observation, Series};
use crate::{Error, Result};

/// A date-indexed series of compounded growth factors (1.0 = starting value).
pub type GrowthSeries = Series;

/// Compound a return series into cumulative growth.
///
/// The running product starts from an anchor of 1.0 before the first return is
/// applied, so the output has the same dates as the input and its first value is
/// `1 + r_0`.
pub fn cumulative_growth(returns: &ReturnSeries) -> Result<GrowthSeries> {
    if returns.is_empty() {
        return Err(Error::EmptyInput(
            "Cannot compound an empty return series".to_string(),
        ));
    }

    let mut cum = 1.0;
    let points = returns
        .iter()
        .map(|obs| {
            cum *= 1.0 + obs.value;
            Observation::new(obs.date, cum)
        })
        .collect();

    Ok(Series::new(points))
}

/// Total compounded return over the whole growth series (e.g. 0.25 for +25%).
pub fn total_return(growth: &GrowthSeries) -> Result<f64> {
    growth
        .last()
        .map(|obs| obs.value - 1.0)
        .ok_or_else(|| Error::EmptyInput("Growth series is empty".to_string()))
}

/// Maximum peak-to-trough decline of a growth series.
///
/// The 1.0 anchor counts as the initial peak, so a loss on the very first day is
/// a drawdown. Returned as a fraction (0.15 for a 15% drawdown).
pub fn max_drawdown(growth: &GrowthSeries) -> Result<f64> {
    if growth.is_empty() {
        return Err(Error::EmptyInput("Growth series is empty".to_string()));
    }

    let mut running_max: f64 = 1.0;
    let mut max_drawdown: f64 = 0.0;

    for obs in growth.iter() {
        running_max = running_max.max(obs.value);
        let drawdown = (running_max - obs.value) / running_max;
        max_drawdown = max_drawdown.max(drawdown);
    }

    Ok(max_drawdown)
}

/// Re-anchor a slice of a growth series so it reads as growth within the slice.
///
/// `base` is the growth value immediately before the slice starts, or `None` to
/// divide by the slice's first value. Period slices from
/// [`segment`](crate::periods::segment) keep full-history cumulative values;
/// this produces the alternate "performance during the period" view.
pub fn rebase(slice: &GrowthSeries, base: Option<f64>) -> Result<GrowthSeries> {
    let anchor = match base.or_else(|| slice.first().map(|obs| obs.value)) {
        Some(anchor) => anchor,
        None => return Ok(Series::empty()),
    };

    if !anchor.is_finite() || anchor <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Cannot rebase growth on a non-positive anchor {}",
            anchor
        )));
    }

    Ok(slice
        .iter()
        .map(|obs| Observation::new(obs.date, obs.value / anchor))
        .collect())
}
