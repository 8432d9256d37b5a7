//! TTL cache of resolved sentiment scores
//!
//! Lookups hit the in-memory map first and fall through to the optional
//! SQLite store, so scores survive across runs. Store errors are logged and
//! otherwise ignored: the cache degrades to memory-only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::Symbol;

use super::store::SqliteSentimentStore;
use super::SentimentScore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self { symbol, date }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub score: SentimentScore,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Entries at least `ttl` old are expired
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at >= ttl
    }
}

pub struct SentimentCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    store: Option<SqliteSentimentStore>,
}

impl SentimentCache {
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            store: None,
        }
    }

    pub fn with_store(ttl: Duration, store: SqliteSentimentStore) -> Self {
        Self {
            store: Some(store),
            ..Self::in_memory(ttl)
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Fresh score for `key`, if any. Expired entries count as absent.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<SentimentScore> {
        {
            let mut entries = self.lock();
            if let Some(entry) = entries.get(key) {
                if !entry.is_expired(now, self.ttl) {
                    debug!(symbol = %key.symbol, date = %key.date, "Sentiment cache hit");
                    return Some(entry.score);
                }
                entries.remove(key);
            }
        }

        let store = self.store.as_ref()?;
        match store.load(key) {
            Ok(Some(entry)) if !entry.is_expired(now, self.ttl) => {
                debug!(symbol = %key.symbol, date = %key.date, "Sentiment loaded from store");
                let score = entry.score;
                self.lock().insert(key.clone(), entry);
                Some(score)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(symbol = %key.symbol, date = %key.date, "Sentiment store read failed: {:#}", e);
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, score: SentimentScore, fetched_at: DateTime<Utc>) {
        let entry = CacheEntry {
            key: key.clone(),
            score,
            fetched_at,
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&entry) {
                warn!(symbol = %key.symbol, date = %key.date, "Sentiment store write failed: {:#}", e);
            }
        }

        self.lock().insert(key, entry);
    }

    /// Drop expired entries from memory and the store. Returns how many
    /// in-memory entries were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let removed = {
            let mut entries = self.lock();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
            before - entries.len()
        };

        if let Some(store) = &self.store {
            let purged = store
                .purge_older_than(now - self.ttl)
                .and_then(|purged| store.count().map(|kept| (purged, kept)));
            match purged {
                Ok((purged, kept)) => info!(
                    "Sentiment store: purged {} expired rows, {} still cached",
                    purged, kept
                ),
                Err(e) => warn!("Sentiment store purge failed: {:#}", e),
            }
        }

        removed
    }

    /// Entries currently held in memory
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
