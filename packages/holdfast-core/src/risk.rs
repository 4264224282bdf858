//! Portfolio risk metrics calculation.
//!
//! Provides annualized Sharpe ratio, Sortino ratio and parametric Value-at-Risk over
//! a daily return series. Every statistic uses the sample standard deviation
//! (N - 1 denominator). None of the functions substitute a fallback value when a
//! statistic is undefined; they return an error instead.

use crate::returns::ReturnSeries;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Trading days used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Deviations at or below this are treated as zero.
const MIN_DEVIATION: f64 = 1e-12;

/// Inputs that parameterize the risk statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Annual risk-free rate (e.g., 0.01 for 1%)
    pub risk_free_rate: f64,
    /// Confidence level for VaR (e.g., 0.95 for 95%)
    pub confidence_level: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            confidence_level: 0.95,
        }
    }
}

impl RiskParameters {
    pub fn new(risk_free_rate: f64, confidence_level: f64) -> Result<Self> {
        let params = Self {
            risk_free_rate,
            confidence_level,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that the rate is finite and the confidence lies strictly in (0, 1).
    pub fn validate(&self) -> Result<()> {
        check_risk_free_rate(self.risk_free_rate)?;
        check_confidence(self.confidence_level)
    }
}

/// Annualized risk statistics of one return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Sharpe ratio (annualized excess return per unit of volatility)
    pub sharpe_ratio: f64,
    /// Sortino ratio (annualized excess return per unit of downside volatility)
    pub sortino_ratio: f64,
    /// Parametric VaR as a positive annualized loss fraction (0.2 = 20%)
    pub value_at_risk: f64,
    /// Confidence level used for VaR
    pub confidence_level: f64,
    /// Annual risk-free rate used for the excess return
    pub risk_free_rate: f64,
    /// Number of daily returns the statistics were computed from
    pub observations: usize,
}

impl RiskSummary {
    /// Compute all three statistics for a return series.
    ///
    /// Fails with the first error any statistic produces: fewer than two returns,
    /// zero volatility, or no downside deviation.
    pub fn compute(returns: &ReturnSeries, params: &RiskParameters) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            sharpe_ratio: sharpe_ratio(returns, params.risk_free_rate)?,
            sortino_ratio: sortino_ratio(returns, params.risk_free_rate)?,
            value_at_risk: value_at_risk(returns, params.confidence_level)?,
            confidence_level: params.confidence_level,
            risk_free_rate: params.risk_free_rate,
            observations: returns.len(),
        })
    }
}

/// Calculate the annualized Sharpe ratio.
///
/// `(mean - rf / 252) / std * sqrt(252)` where `rf` is the annual risk-free rate.
///
/// # Errors
///
/// * [`Error::InsufficientData`] with fewer than two returns
/// * [`Error::DegenerateDistribution`] when the returns have zero deviation
pub fn sharpe_ratio(returns: &ReturnSeries, risk_free_rate: f64) -> Result<f64> {
    check_risk_free_rate(risk_free_rate)?;
    let values = sample(returns, "Sharpe ratio")?;

    let mean = mean(&values);
    let std = sample_std(&values, mean);
    if std <= MIN_DEVIATION {
        return Err(Error::DegenerateDistribution(
            "Sharpe ratio is undefined for returns with zero deviation".to_string(),
        ));
    }

    Ok(excess_return(mean, risk_free_rate) / std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Calculate the annualized Sortino ratio.
///
/// Same numerator as the Sharpe ratio; the denominator is the sample deviation of
/// the strictly negative returns only.
///
/// # Errors
///
/// * [`Error::InsufficientData`] with fewer than two returns
/// * [`Error::DegenerateDistribution`] with fewer than two negative returns or
///   when the negative returns have zero deviation
pub fn sortino_ratio(returns: &ReturnSeries, risk_free_rate: f64) -> Result<f64> {
    check_risk_free_rate(risk_free_rate)?;
    let values = sample(returns, "Sortino ratio")?;

    let downside: Vec<f64> = values.iter().copied().filter(|&r| r < 0.0).collect();
    match downside.len() {
        0 => {
            return Err(Error::DegenerateDistribution(
                "Sortino ratio is undefined without downside returns".to_string(),
            ))
        }
        1 => {
            return Err(Error::DegenerateDistribution(
                "Sortino ratio needs at least two downside returns".to_string(),
            ))
        }
        _ => {}
    }

    let downside_std = sample_std(&downside, mean(&downside));
    if downside_std <= MIN_DEVIATION {
        return Err(Error::DegenerateDistribution(
            "Sortino ratio is undefined for downside returns with zero deviation".to_string(),
        ));
    }

    Ok(excess_return(mean(&values), risk_free_rate) / downside_std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Calculate Value at Risk using the parametric (Gaussian) method.
///
/// `VaR = norm_ppf(1 - confidence) * std - mean`, annualized by `sqrt(252)` and
/// negated, so a loss is a positive magnitude: `(|z| * std + mean) * sqrt(252)`
/// for `confidence > 0.5`. This assumes daily returns are roughly normally
/// distributed; fat-tailed series will understate the true risk.
///
/// The value goes negative when the mean daily loss exceeds `|z| * std`, as for
/// a series that falls steadily every day. It is returned as computed.
///
/// # Errors
///
/// * [`Error::InvalidParameter`] unless `0 < confidence < 1`
/// * [`Error::InsufficientData`] with fewer than two returns
pub fn value_at_risk(returns: &ReturnSeries, confidence: f64) -> Result<f64> {
    check_confidence(confidence)?;
    let values = sample(returns, "Value at Risk")?;

    let mean = mean(&values);
    let std = sample_std(&values, mean);

    let z = norm_ppf(1.0 - confidence);
    let var_daily = z * std - mean;
    Ok(-(var_daily * TRADING_DAYS_PER_YEAR.sqrt()))
}

/// Calculate annualized volatility (sample deviation scaled by `sqrt(252)`).
pub fn annualized_volatility(returns: &ReturnSeries) -> Result<f64> {
    let values = sample(returns, "volatility")?;
    Ok(sample_std(&values, mean(&values)) * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Inverse cumulative distribution function for standard normal distribution.
///
/// Uses Acklam's algorithm for high accuracy across the full range.
/// Source: https://web.archive.org/web/20151110174102/http://home.online.no/~pjacklam/notes/invnorm/
pub fn norm_ppf(p: f64) -> f64 {
    // Coefficients in rational approximations
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];

    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];

    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];

    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

fn sample(returns: &ReturnSeries, statistic: &str) -> Result<Vec<f64>> {
    if returns.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "{} needs at least 2 returns, got {}",
            statistic,
            returns.len()
        )));
    }
    Ok(returns.values())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn excess_return(mean: f64, risk_free_rate: f64) -> f64 {
    mean - risk_free_rate / TRADING_DAYS_PER_YEAR
}

fn check_risk_free_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "Risk-free rate must be finite, got {}",
            rate
        )));
    }
    Ok(())
}

fn check_confidence(confidence: f64) -> Result<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::InvalidParameter(format!(
            "Confidence level must be in (0, 1), got {}",
            confidence
        )));
    }
    Ok(())
}
