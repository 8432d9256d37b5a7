//! News source capability and its error type

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Symbol;

/// The news sources the provider knows how to talk to, in their default
/// order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// CryptoPanic free tier
    CryptoPanic,
    /// CryptoPanic paid tier
    CryptoPanicPro,
    /// NewsAPI general news search
    NewsApi,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::CryptoPanic,
        SourceKind::CryptoPanicPro,
        SourceKind::NewsApi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::CryptoPanic => "cryptopanic",
            SourceKind::CryptoPanicPro => "cryptopanic_pro",
            SourceKind::NewsApi => "newsapi",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Environment variable holding this source's credential
    pub fn env_var(self) -> &'static str {
        match self {
            SourceKind::CryptoPanic => "CRYPTOPANIC_API_KEY",
            SourceKind::CryptoPanicPro => "CRYPTOPANIC_PRO_API_KEY",
            SourceKind::NewsApi => "NEWSAPI_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            SourceKind::CryptoPanic => "https://cryptopanic.com/api/v1/posts/",
            SourceKind::CryptoPanicPro => "https://cryptopanic.com/api/pro/v1/posts/",
            SourceKind::NewsApi => "https://newsapi.org/v2/everything",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single news item
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Half-open UTC interval `[start, end)` of whole days around a target date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlineWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HeadlineWindow {
    /// Days `date - days_before` through `date + days_after`, inclusive
    pub fn around(date: NaiveDate, days_before: u32, days_after: u32) -> Self {
        let first = date - Duration::days(i64::from(days_before));
        let after_last = date + Duration::days(i64::from(days_after) + 1);
        HeadlineWindow {
            start: first.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: after_last.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::days(1)).date_naive()
    }
}

/// Why a source could not produce headlines. Never fatal: the provider
/// logs it and moves on to the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no credential configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("no headlines in window")]
    Empty,

    #[error("circuit open after repeated failures")]
    CircuitOpen,

    #[error("{date} is older than the {days} days of history this source serves")]
    OutsideHistory { date: NaiveDate, days: i64 },
}

// The request URL carries the API key as a query parameter, so it is
// stripped before the error text can reach a log line.
impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A news source that can be asked for headlines about a symbol.
///
/// Implementations only fetch and parse; scoring, rate limiting and failure
/// bookkeeping are applied uniformly by `SentimentProvider`.
pub trait SentimentSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// False when the credential is missing; the source is then skipped
    fn is_configured(&self) -> bool;

    fn fetch_headlines(
        &self,
        symbol: &Symbol,
        window: &HeadlineWindow,
    ) -> Result<Vec<Headline>, SourceError>;
}

/// GET `url` with query `params`, returning the body of a 2xx response
pub(crate) fn get_text(
    client: &Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, SourceError> {
    let response = client.get(url).query(params).send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SourceError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    Ok(response.text()?)
}

pub(crate) fn build_client(timeout: std::time::Duration) -> anyhow::Result<Client> {
    use anyhow::Context;
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}
