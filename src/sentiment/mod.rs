//! Daily news sentiment for a symbol
//!
//! `SentimentProvider` resolves a score in [-1, 1] for a (symbol, date):
//!
//! 1. A fresh cache entry wins (memory, then the SQLite store)
//! 2. Otherwise each configured source is tried in order, paced by its own
//!    rate limiter and guarded by its own circuit breaker
//! 3. Otherwise the price-momentum fallback answers
//!
//! Source failures are never fatal. Only news-derived scores are cached; the
//! fallback is cheap and deterministic so it is recomputed every time.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod cryptopanic;
pub mod fallback;
pub mod newsapi;
pub mod source;
pub mod store;

pub use analyzer::{LexiconAnalyzer, PolarityAnalyzer};
pub use cache::{CacheEntry, CacheKey, SentimentCache};
pub use config::{SentimentConfig, SourceConfig, WindowConfig};
pub use fallback::FallbackConfig;
pub use source::{Headline, HeadlineWindow, SentimentSource, SourceError, SourceKind};
pub use store::SqliteSentimentStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::common::{CircuitBreaker, CircuitBreakerConfig, RateLimiter};
use crate::config::Credentials;
use crate::error::DcaResult;
use crate::{PriceSeries, Symbol};

use cryptopanic::CryptoPanicSource;
use newsapi::NewsApiSource;

/// Where a score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Provider(SourceKind),
    Fallback,
}

impl ScoreSource {
    pub fn name(self) -> &'static str {
        match self {
            ScoreSource::Provider(kind) => kind.name(),
            ScoreSource::Fallback => "fallback",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == "fallback" {
            Some(ScoreSource::Fallback)
        } else {
            SourceKind::from_name(name).map(ScoreSource::Provider)
        }
    }

    pub fn is_fallback(self) -> bool {
        self == ScoreSource::Fallback
    }
}

impl std::fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub date: NaiveDate,
    /// Always within [-1, 1]
    pub value: f64,
    pub source: ScoreSource,
}

struct SourceSlot {
    source: Box<dyn SentimentSource>,
    limiter: RateLimiter,
    breaker: Mutex<CircuitBreaker>,
}

impl SourceSlot {
    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        self.breaker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SentimentProvider {
    slots: Vec<SourceSlot>,
    analyzer: Box<dyn PolarityAnalyzer>,
    cache: SentimentCache,
    window: WindowConfig,
    fallback: FallbackConfig,
    breaker_config: CircuitBreakerConfig,
    use_real_news: bool,
    key_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl SentimentProvider {
    /// Provider with no sources yet; add them with [`with_source`](Self::with_source)
    pub fn new(config: &SentimentConfig, cache: SentimentCache) -> Self {
        Self {
            slots: Vec::new(),
            analyzer: Box::new(LexiconAnalyzer::default()),
            cache,
            window: config.window,
            fallback: config.fallback.clone(),
            breaker_config: CircuitBreakerConfig::default()
                .with_failure_threshold(config.circuit_breaker.failure_threshold)
                .with_open_timeout(Duration::from_secs(config.circuit_breaker.open_timeout_secs)),
            use_real_news: config.use_real_news,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the HTTP source chain and cache described by `config`
    pub fn from_config(config: &SentimentConfig, credentials: &Credentials) -> anyhow::Result<Self> {
        config.validate()?;

        let cache = match (&config.cache_path, config.use_real_news) {
            (Some(path), true) => match SqliteSentimentStore::open(path) {
                Ok(store) => SentimentCache::with_store(config.cache_ttl(), store),
                Err(e) => {
                    warn!("Sentiment store unavailable, caching in memory only: {:#}", e);
                    SentimentCache::in_memory(config.cache_ttl())
                }
            },
            _ => SentimentCache::in_memory(config.cache_ttl()),
        };
        if cache.has_store() {
            // rows past the TTL would never be served again
            cache.purge_expired(Utc::now());
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let mut provider = Self::new(config, cache);

        for source_config in &config.sources {
            let kind = source_config.kind;
            let api_key = credentials.get(kind).map(str::to_string);
            let source: Box<dyn SentimentSource> = match kind {
                SourceKind::CryptoPanic | SourceKind::CryptoPanicPro => Box::new(
                    CryptoPanicSource::new(kind, api_key, source_config.base_url.clone(), timeout)?,
                ),
                SourceKind::NewsApi => Box::new(NewsApiSource::new(
                    api_key,
                    source_config.base_url.clone(),
                    source_config.max_history_days,
                    timeout,
                )?),
            };
            provider = provider.with_source(source, Duration::from_millis(source_config.min_interval_ms));
        }

        if config.use_real_news {
            let configured = provider.configured_sources();
            if configured.is_empty() {
                warn!("No news source credentials found, sentiment will use the price-momentum fallback");
            } else {
                info!("Sentiment sources: {}", configured.iter().join(", "));
            }
        }

        Ok(provider)
    }

    /// Append a source to the end of the chain
    pub fn with_source(mut self, source: Box<dyn SentimentSource>, min_interval: Duration) -> Self {
        let breaker = CircuitBreaker::new(source.kind().name(), self.breaker_config.clone());
        self.slots.push(SourceSlot {
            source,
            limiter: RateLimiter::with_min_interval(min_interval),
            breaker: Mutex::new(breaker),
        });
        self
    }

    pub fn configured_sources(&self) -> Vec<SourceKind> {
        self.slots
            .iter()
            .filter(|slot| slot.source.is_configured())
            .map(|slot| slot.source.kind())
            .collect()
    }

    pub fn uses_real_news(&self) -> bool {
        self.use_real_news
    }

    pub fn cache(&self) -> &SentimentCache {
        &self.cache
    }

    /// Sentiment for `date`, which must be one of the series' dates.
    ///
    /// Calls for the same (symbol, date) are serialized, so concurrent
    /// callers share one fetch instead of racing.
    pub fn get_sentiment(&self, series: &PriceSeries, date: NaiveDate) -> DcaResult<SentimentScore> {
        series.require_index(date)?;

        let key = CacheKey::new(series.symbol().clone(), date);
        let key_lock = self.key_lock(&key);
        let result = {
            let _guard = key_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.resolve(series, &key)
        };
        self.release_key_lock(&key, key_lock);
        result
    }

    fn resolve(&self, series: &PriceSeries, key: &CacheKey) -> DcaResult<SentimentScore> {
        let date = key.date;
        if let Some(score) = self.cache.get(key, Utc::now()) {
            return Ok(score);
        }

        if self.use_real_news {
            if let Some(score) = self.fetch_from_sources(series.symbol(), date) {
                self.cache.insert(key.clone(), score, Utc::now());
                return Ok(score);
            }
        }

        let score = fallback::fallback_score(series, date, &self.fallback)?;
        debug!(symbol = %series.symbol(), %date, value = score.value, "Using price-momentum sentiment");
        Ok(score)
    }

    /// One score per bar, in date order
    pub fn sentiment_series(&self, series: &PriceSeries) -> DcaResult<Vec<SentimentScore>> {
        series
            .bars()
            .iter()
            .map(|bar| self.get_sentiment(series, bar.date))
            .collect()
    }

    fn fetch_from_sources(&self, symbol: &Symbol, date: NaiveDate) -> Option<SentimentScore> {
        let window = HeadlineWindow::around(date, self.window.days_before, self.window.days_after);

        for slot in &self.slots {
            let kind = slot.source.kind();
            match self.score_from(slot, symbol, &window) {
                Ok(value) => {
                    debug!(source = %kind, %symbol, %date, value, "Sentiment from news");
                    return Some(SentimentScore {
                        date,
                        value,
                        source: ScoreSource::Provider(kind),
                    });
                }
                Err(SourceError::NotConfigured) | Err(SourceError::CircuitOpen) => {}
                Err(e @ (SourceError::Empty | SourceError::OutsideHistory { .. })) => {
                    debug!(source = %kind, %symbol, %date, "No usable headlines: {}", e)
                }
                Err(e) => warn!(source = %kind, %symbol, %date, "Sentiment source failed: {}", e),
            }
        }

        None
    }

    fn score_from(
        &self,
        slot: &SourceSlot,
        symbol: &Symbol,
        window: &HeadlineWindow,
    ) -> Result<f64, SourceError> {
        if !slot.source.is_configured() {
            return Err(SourceError::NotConfigured);
        }
        if !slot.breaker().can_attempt() {
            return Err(SourceError::CircuitOpen);
        }

        slot.limiter.acquire();
        let result = slot.source.fetch_headlines(symbol, window).and_then(|headlines| {
            let headlines: Vec<Headline> = headlines
                .into_iter()
                .filter(|h| window.contains(h.published_at))
                .unique_by(|h| h.title.trim().to_lowercase())
                .collect();
            analyzer::mean_polarity(self.analyzer.as_ref(), &headlines).ok_or(SourceError::Empty)
        });

        let mut breaker = slot.breaker();
        match &result {
            Ok(_) => breaker.record_success(),
            Err(_) => breaker.record_failure(),
        }
        result
    }

    fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Drop the per-key lock once no other caller holds or waits on it
    fn release_key_lock(&self, key: &CacheKey, key_lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // one handle in the map, one here
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(key);
        }
    }
}
