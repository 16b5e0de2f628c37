//! Serializable analysis configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for an analysis run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Serializable configuration for a single analysis run.
///
/// This struct captures all parameters needed to reproduce a run:
/// ticker universe, date range, return horizons, the divergence window,
/// and provider pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Ticker universe, fetched and analyzed independently.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// History start date (inclusive).
    #[serde(default = "default_start")]
    pub start: NaiveDate,

    /// History end date (inclusive); `None` means today.
    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Forward-return horizons in trading days.
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,

    /// Rolling-high window for divergence detection.
    #[serde(default = "default_divergence_window")]
    pub divergence_window: usize,

    /// Primary-provider rate budget in calls per minute.
    #[serde(default = "default_calls_per_min")]
    pub calls_per_min: u32,

    /// Environment variable holding the primary provider's API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Directory for cached input tables.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory under which run artifact bundles are created.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_tickers() -> Vec<String> {
    vec!["SPY".into(), "QQQ".into(), "DIA".into()]
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2011, 1, 1).unwrap_or_default()
}

fn default_horizons() -> Vec<usize> {
    vec![1, 5, 20]
}

fn default_divergence_window() -> usize {
    20
}

fn default_calls_per_min() -> u32 {
    5
}

fn default_api_key_env() -> String {
    "ALPHAVANTAGE_API_KEY".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            start: default_start(),
            end: None,
            horizons: default_horizons(),
            divergence_window: default_divergence_window(),
            calls_per_min: default_calls_per_min(),
            api_key_env: default_api_key_env(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl AnalysisConfig {
    /// Load a TOML config; absent fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Invalid("ticker universe is empty".into()));
        }
        if self.horizons.is_empty() || self.horizons.contains(&0) {
            return Err(ConfigError::Invalid(
                "horizons must be non-empty and positive".into(),
            ));
        }
        if self.divergence_window == 0 {
            return Err(ConfigError::Invalid(
                "divergence_window must be positive".into(),
            ));
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(ConfigError::Invalid(format!(
                    "end date {end} precedes start date {}",
                    self.start
                )));
            }
        }
        Ok(())
    }

    /// Deterministic hash ID for this configuration. Two identical
    /// configs produce the same RunId, so artifact bundles can be traced
    /// back to exact parameters.
    pub fn run_id(&self) -> RunId {
        match serde_json::to_string(self) {
            Ok(json) => blake3::hash(json.as_bytes()).to_hex().to_string(),
            Err(_) => "unhashable-config".into(),
        }
    }
}
