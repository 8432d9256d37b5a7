//! Sentiment provider settings
//!
//! Source chain order, cache lifetime, headline window, fallback tuning and
//! circuit-breaker thresholds. API keys are not part of this file.

use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};

use super::fallback::FallbackConfig;
use super::newsapi::FREE_TIER_HISTORY_DAYS;
use super::source::SourceKind;

/// Longest cache lifetime accepted (one hundred years)
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 100;

/// Longest source history horizon accepted (one hundred years)
pub const MAX_HISTORY_DAYS: i64 = 365 * 100;

/// One entry in the ordered source chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Override the source's public endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Oldest date (in days before today) the account can query
    #[serde(default)]
    pub max_history_days: Option<i64>,
}

fn default_min_interval_ms() -> u64 {
    1000
}

impl SourceConfig {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            base_url: None,
            min_interval_ms: default_min_interval_ms(),
            max_history_days: None,
        }
    }
}

/// Days of headlines considered around each target date
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub days_before: u32,
    pub days_after: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days_before: 1,
            days_after: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub open_timeout_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Off means every score comes from the price-momentum fallback
    pub use_real_news: bool,
    pub cache_ttl_hours: i64,
    /// SQLite file for persisted scores; memory-only when unset
    pub cache_path: Option<String>,
    pub request_timeout_secs: u64,
    pub window: WindowConfig,
    pub fallback: FallbackConfig,
    pub circuit_breaker: BreakerSettings,
    /// Tried in order; the first one that yields headlines wins
    pub sources: Vec<SourceConfig>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            use_real_news: true,
            cache_ttl_hours: 168,
            cache_path: Some("cache/sentiment.db".to_string()),
            request_timeout_secs: 10,
            window: WindowConfig::default(),
            fallback: FallbackConfig::default(),
            circuit_breaker: BreakerSettings::default(),
            sources: vec![
                SourceConfig::new(SourceKind::CryptoPanic),
                SourceConfig::new(SourceKind::CryptoPanicPro),
                SourceConfig {
                    max_history_days: Some(FREE_TIER_HISTORY_DAYS),
                    ..SourceConfig::new(SourceKind::NewsApi)
                },
            ],
        }
    }
}

impl SentimentConfig {
    /// Fully offline: fallback scores only, nothing persisted
    pub fn offline() -> Self {
        Self {
            use_real_news: false,
            cache_path: None,
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours.clamp(0, MAX_CACHE_TTL_HOURS))
    }

    pub fn validate(&self) -> DcaResult<()> {
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.cache_ttl_hours) {
            return Err(DcaError::InvalidConfig(format!(
                "sentiment cache_ttl_hours must be within 0..={}, got {}",
                MAX_CACHE_TTL_HOURS, self.cache_ttl_hours
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(DcaError::InvalidConfig(
                "sentiment request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(DcaError::InvalidConfig(
                "circuit_breaker failure_threshold must be positive".to_string(),
            ));
        }
        for (i, source) in self.sources.iter().enumerate() {
            if self.sources[..i].iter().any(|s| s.kind == source.kind) {
                return Err(DcaError::InvalidConfig(format!(
                    "sentiment source {} listed twice",
                    source.kind
                )));
            }
            if source
                .max_history_days
                .is_some_and(|d| !(0..=MAX_HISTORY_DAYS).contains(&d))
            {
                return Err(DcaError::InvalidConfig(format!(
                    "{} max_history_days must be within 0..={}",
                    source.kind, MAX_HISTORY_DAYS
                )));
            }
        }
        self.fallback.validate()
    }
}
