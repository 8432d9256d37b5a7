// Sentiment store
// SQLite persistence for resolved sentiment scores
//
// One row per (symbol, date). Rows are overwritten on refresh and carry the
// time they were fetched so the cache can apply its TTL on read.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::cache::{CacheEntry, CacheKey};
use super::{ScoreSource, SentimentScore};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteSentimentStore {
    conn: Mutex<Connection>,
}

impl SqliteSentimentStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let store = Self::from_connection(conn)?;
        info!("Sentiment store opened at {}", db_path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sentiment_cache (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL NOT NULL,
                source TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;
        debug!("Sentiment schema created/verified");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn save(&self, entry: &CacheEntry) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO sentiment_cache (symbol, date, value, source, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.key.symbol.as_str(),
                entry.key.date.format(DATE_FORMAT).to_string(),
                entry.score.value,
                entry.score.source.name(),
                entry.fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ],
        )?;

        debug!(
            "Saved sentiment {:.3} for {} {}",
            entry.score.value, entry.key.symbol, entry.key.date
        );
        Ok(())
    }

    pub fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT value, source, fetched_at FROM sentiment_cache WHERE symbol = ?1 AND date = ?2",
        )?;

        let row = stmt.query_row(
            params![key.symbol.as_str(), key.date.format(DATE_FORMAT).to_string()],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        );

        match row {
            Ok((value, source, fetched_at)) => {
                let source = ScoreSource::from_name(&source)
                    .ok_or_else(|| anyhow!("Unknown sentiment source in store: {}", source))?;
                let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
                    .with_context(|| format!("Bad fetched_at timestamp: {}", fetched_at))?
                    .with_timezone(&Utc);

                Ok(Some(CacheEntry {
                    key: key.clone(),
                    score: SentimentScore {
                        date: key.date,
                        value,
                        source,
                    },
                    fetched_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete rows fetched before `cutoff`
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM sentiment_cache WHERE fetched_at < ?1",
            params![cutoff.to_rfc3339_opts(SecondsFormat::Millis, true)],
        )?;
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM sentiment_cache", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SourceKind;
    use crate::Symbol;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn entry(day: u32, value: f64, fetched_at: DateTime<Utc>) -> CacheEntry {
        let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        CacheEntry {
            key: CacheKey::new(Symbol::new("ETH-USD"), date),
            score: SentimentScore {
                date,
                value,
                source: ScoreSource::Provider(SourceKind::CryptoPanic),
            },
            fetched_at,
        }
    }

    #[test]
    fn test_save_and_load() {
        let store = SqliteSentimentStore::open_in_memory().unwrap();
        let e = entry(1, 0.35, Utc::now());
        store.save(&e).unwrap();

        let loaded = store.load(&e.key).unwrap().unwrap();
        assert_eq!(loaded.score, e.score);
        assert_eq!(loaded.fetched_at.timestamp(), e.fetched_at.timestamp());

        let missing = entry(2, 0.0, Utc::now());
        assert!(store.load(&missing.key).unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites_same_key() {
        let store = SqliteSentimentStore::open_in_memory().unwrap();
        store.save(&entry(3, 0.1, Utc::now())).unwrap();
        store.save(&entry(3, -0.4, Utc::now())).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let loaded = store.load(&entry(3, 0.0, Utc::now()).key).unwrap().unwrap();
        assert_eq!(loaded.score.value, -0.4);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("sentiment.db");
        let e = entry(4, 0.8, Utc::now());

        {
            let store = SqliteSentimentStore::open(&path).unwrap();
            store.save(&e).unwrap();
        }

        let store = SqliteSentimentStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let loaded = store.load(&e.key).unwrap().unwrap();
        assert_eq!(loaded.score, e.score);
    }

    #[test]
    fn test_purge_older_than() {
        let store = SqliteSentimentStore::open_in_memory().unwrap();
        let now = Utc::now();
        store.save(&entry(5, 0.0, now - Duration::days(10))).unwrap();
        store.save(&entry(6, 0.0, now)).unwrap();

        assert_eq!(store.purge_older_than(now - Duration::days(1)).unwrap(), 1);
        assert_eq!(store.count().unwrap(), 1);
    }
}
