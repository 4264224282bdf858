//! Hand-off of computed results to a renderer.
//!
//! The core never formats numbers; a [`ReportSink`] receives an
//! [`AnalysisReport`] of raw values and decides how to present them.

use crate::growth::GrowthSeries;
use crate::pipeline::PortfolioAnalysis;
use crate::risk::RiskSummary;
use crate::types::{ApiResponse, Asset};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// Risk statistics, or the reason they are undefined for this series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskOutcome {
    Computed(RiskSummary),
    Undefined { reason: String },
}

/// Growth inside one named period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Cumulative growth as computed over the full history
    pub growth: GrowthSeries,
    /// Growth re-anchored to 1.0 at the first observation of the period
    pub rebased: GrowthSeries,
}

/// Everything a renderer needs to display one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub assets: Vec<Asset>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub observations: usize,
    pub total_return: f64,
    pub max_drawdown: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_volatility: Option<f64>,
    pub risk: RiskOutcome,
    pub growth: GrowthSeries,
    pub periods: Vec<PeriodReport>,
}

impl AnalysisReport {
    /// Collect the displayable results of an analysis.
    ///
    /// A risk statistic that is undefined for the series (too few returns, no
    /// deviation, no downside) is reported as [`RiskOutcome::Undefined`] with the
    /// reason; any other error is returned.
    pub fn from_analysis(analysis: &PortfolioAnalysis) -> Result<Self> {
        let risk = match analysis.risk_summary() {
            Ok(summary) => RiskOutcome::Computed(summary),
            Err(e @ (Error::InsufficientData(_) | Error::DegenerateDistribution(_))) => {
                tracing::warn!("Risk statistics undefined: {}", e);
                RiskOutcome::Undefined {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        let annualized_volatility = match analysis.annualized_volatility() {
            Ok(volatility) => Some(volatility),
            Err(e @ Error::InsufficientData(_)) => {
                tracing::warn!("Volatility undefined: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        let periods = analysis
            .periods
            .iter()
            .map(|slice| {
                Ok(PeriodReport {
                    name: slice.period.name.clone(),
                    start: slice.period.start,
                    end: slice.period.end,
                    growth: slice.growth.clone(),
                    rebased: slice.rebased()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            assets: analysis.prices.assets().to_vec(),
            start_date: analysis.growth.first().map(|o| o.date),
            end_date: analysis.growth.last().map(|o| o.date),
            observations: analysis.returns.len(),
            total_return: analysis.total_return()?,
            max_drawdown: analysis.max_drawdown()?,
            annualized_volatility,
            risk,
            growth: analysis.growth.clone(),
            periods,
        })
    }
}

/// Consumer of computed analysis results.
pub trait ReportSink {
    fn emit(&mut self, report: &AnalysisReport) -> Result<()>;
}

/// Writes reports as JSON, optionally wrapped in an [`ApiResponse`] envelope.
#[derive(Debug)]
pub struct JsonSink<W: Write> {
    writer: W,
    envelope: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            envelope: false,
        }
    }

    /// Wrap each report as `{"ok": true, "data": ...}`.
    pub fn with_envelope(mut self) -> Self {
        self.envelope = true;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn emit(&mut self, report: &AnalysisReport) -> Result<()> {
        if self.envelope {
            serde_json::to_writer_pretty(&mut self.writer, &ApiResponse::ok(report))?;
        } else {
            serde_json::to_writer_pretty(&mut self.writer, report)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}
