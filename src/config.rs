//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. News API keys
//! never live in the file: they are read once from the environment (and an
//! optional `.env`) into [`Credentials`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DcaError;
use crate::sentiment::{SentimentConfig, SourceKind};
use crate::strategies::rsi_dca::RsiDcaConfig;
use crate::strategies::sentiment_dca::SentimentDcaConfig;
use crate::strategies::sip::SipConfig;
use crate::Symbol;

/// Lookback windows the backtester accepts, in years
pub const SUPPORTED_YEARS: [u32; 4] = [1, 3, 5, 10];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backtest: BacktestConfig,
    pub sip: SipConfig,
    pub rsi_dca: RsiDcaConfig,
    pub sentiment_dca: SentimentDcaConfig,
    pub sentiment: SentimentConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.backtest.validate()?;
        self.sip.validate().context("Invalid sip section")?;
        self.rsi_dca.validate().context("Invalid rsi_dca section")?;
        self.sentiment_dca
            .validate()
            .context("Invalid sentiment_dca section")?;
        self.sentiment.validate().context("Invalid sentiment section")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub symbol: String,
    /// Trailing window to simulate; `None` uses the whole file
    pub years: Option<u32>,
    /// Daily close CSV; defaults to `data/<symbol>.csv`
    pub data_file: Option<String>,
    pub results_dir: String,
    /// Registry names of the strategies to run, in report order
    pub strategies: Vec<String>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbol: "BTC-USD".to_string(),
            years: Some(10),
            data_file: None,
            results_dir: "results".to_string(),
            strategies: vec![
                "sip".to_string(),
                "rsi_dca".to_string(),
                "sentiment_dca".to_string(),
            ],
        }
    }
}

impl BacktestConfig {
    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.symbol.clone())
    }

    pub fn data_path(&self) -> PathBuf {
        match &self.data_file {
            Some(file) => PathBuf::from(file),
            None => Path::new("data").join(format!("{}.csv", self.symbol)),
        }
    }

    pub fn validate(&self) -> Result<(), DcaError> {
        if self.symbol.trim().is_empty() {
            return Err(DcaError::InvalidConfig("backtest symbol is empty".to_string()));
        }
        if let Some(years) = self.years {
            if !SUPPORTED_YEARS.contains(&years) {
                return Err(DcaError::InvalidConfig(format!(
                    "backtest years must be one of {:?}, got {}",
                    SUPPORTED_YEARS, years
                )));
            }
        }
        if self.strategies.is_empty() {
            return Err(DcaError::InvalidConfig(
                "backtest needs at least one strategy".to_string(),
            ));
        }
        Ok(())
    }
}

/// API keys for the news sources, looked up once at startup
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<SourceKind, String>,
}

impl Credentials {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read keys from the process environment, loading `.env` first if present
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; blank values count as missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = SourceKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let value = lookup(kind.env_var())?;
                let value = value.trim();
                (!value.is_empty()).then(|| (kind, value.to_string()))
            })
            .collect();
        Self { keys }
    }

    pub fn get(&self, kind: SourceKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn configured(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|k| self.keys.contains_key(k))
            .collect()
    }
}

// keys stay out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.configured())
            .finish()
    }
}
