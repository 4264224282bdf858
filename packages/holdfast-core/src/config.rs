//! Analysis configuration loaded from TOML.
//!
//! ```toml
//! start_date = "2000-01-01"
//! end_date = "2020-12-31"
//! risk_free_rate = 0.01
//! confidence_level = 0.95
//!
//! [[holdings]]
//! asset = "TLT"
//! weight = 0.4
//!
//! [[holdings]]
//! asset = "VNQ"
//! weight = 0.6
//!
//! [[recession_periods]]
//! name = "COVID-19 Recession"
//! start = "2020-02-01"
//! end = "2020-04-01"
//! ```
//!
//! `risk_free_rate`, `confidence_level` and `recession_periods` fall back to
//! 0.01, 0.95 and the built-in catalogue when omitted.

use crate::periods::{default_recession_periods, RecessionPeriod};
use crate::risk::RiskParameters;
use crate::types::Asset;
use crate::weights::WeightVector;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default config location.
pub const CONFIG_ENV_VAR: &str = "HOLDFAST_CONFIG";

/// One asset of the allocation and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub asset: Asset,
    pub weight: f64,
}

/// Everything a single analysis run depends on besides the price data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// First date of the analysis window (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last date of the analysis window (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Annual risk-free rate
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// VaR confidence level
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Ordered allocation
    #[serde(default)]
    pub holdings: Vec<Holding>,
    /// Named periods to segment growth by
    #[serde(default = "default_recession_periods")]
    pub recession_periods: Vec<RecessionPeriod>,
}

fn default_risk_free_rate() -> f64 {
    RiskParameters::default().risk_free_rate
}

fn default_confidence_level() -> f64 {
    RiskParameters::default().confidence_level
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            risk_free_rate: default_risk_free_rate(),
            confidence_level: default_confidence_level(),
            holdings: Vec::new(),
            recession_periods: default_recession_periods(),
        }
    }
}

impl AnalysisConfig {
    /// Create a config for an allocation, with default parameters and catalogue.
    pub fn with_holdings<I, A>(holdings: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<Asset>,
    {
        Self {
            holdings: holdings
                .into_iter()
                .map(|(asset, weight)| Holding {
                    asset: asset.into(),
                    weight,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Restrict the analysis to an inclusive date window.
    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Get the default config file path.
    ///
    /// Default path: `~/.holdfast/config.toml`
    /// Can be overridden with the `HOLDFAST_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".holdfast/config.toml"))
            .unwrap_or_else(|| PathBuf::from("holdfast.toml"))
    }

    /// Load and validate the config at the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load and validate a config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(
            "Loaded config from {} ({} holdings)",
            path.display(),
            config.holdings.len()
        );
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the allocation, risk parameters, window and catalogue.
    pub fn validate(&self) -> Result<()> {
        self.weights()?;
        self.risk_parameters()?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::InvalidParameter(format!(
                    "end_date ({}) is before start_date ({})",
                    end, start
                )));
            }
        }

        for period in &self.recession_periods {
            period.validate()?;
        }
        Ok(())
    }

    /// Configured assets in allocation order.
    pub fn assets(&self) -> Vec<Asset> {
        self.holdings.iter().map(|h| h.asset.clone()).collect()
    }

    pub fn weights(&self) -> Result<WeightVector> {
        WeightVector::new(self.holdings.iter().map(|h| (&h.asset, h.weight)))
    }

    pub fn risk_parameters(&self) -> Result<RiskParameters> {
        RiskParameters::new(self.risk_free_rate, self.confidence_level)
    }

    /// The analysis window; an open side extends to the earliest/latest date.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (None, None) => None,
            (start, end) => Some((
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_with_defaults() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            [[holdings]]
            asset = "gld"
            weight = 0.25

            [[holdings]]
            asset = "BND"
            weight = 0.75
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.assets(), vec![Asset::new("GLD"), Asset::new("BND")]);
        assert_eq!(config.risk_free_rate, 0.01);
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.recession_periods, default_recession_periods());
        assert_eq!(config.window(), None);
    }

    #[test]
    fn test_parse_full_config() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            start_date = "2000-01-01"
            end_date = "2020-12-31"
            risk_free_rate = 0.02
            confidence_level = 0.99

            [[holdings]]
            asset = "TLT"
            weight = 1.0

            [[recession_periods]]
            name = "Taper Tantrum"
            start = "2013-05-01"
            end = "2013-09-30"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.window(), Some((date(2000, 1, 1), date(2020, 12, 31))));
        assert_eq!(config.risk_parameters().unwrap().confidence_level, 0.99);
        assert_eq!(config.recession_periods.len(), 1);
        assert_eq!(config.recession_periods[0].name, "Taper Tantrum");
    }

    #[test]
    fn test_open_window() {
        let mut config = AnalysisConfig::with_holdings([("A", 1.0)]);
        config.start_date = Some(date(2010, 1, 1));
        assert_eq!(config.window(), Some((date(2010, 1, 1), NaiveDate::MAX)));
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let config = AnalysisConfig::with_holdings([("A", 0.5), ("B", 0.4)]);
        assert!(matches!(config.validate(), Err(Error::WeightMismatch(_))));

        let empty = AnalysisConfig::default();
        assert!(matches!(empty.validate(), Err(Error::WeightMismatch(_))));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut config = AnalysisConfig::with_holdings([("A", 1.0)]);
        config.confidence_level = 1.5;
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));

        let inverted = AnalysisConfig::with_holdings([("A", 1.0)])
            .with_window(date(2020, 1, 1), date(2019, 1, 1));
        assert!(matches!(inverted.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = AnalysisConfig::with_holdings([("JNJ", 0.4), ("TLT", 0.6)])
            .with_window(date(2005, 1, 3), date(2010, 12, 31));
        config.save_to_path(&path).unwrap();

        let loaded = AnalysisConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "holdings = 3").unwrap();

        let result = AnalysisConfig::load_from_path(&path);
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = AnalysisConfig::load_from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
