//! NewsAPI `everything` search

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::Symbol;

use super::source::{
    build_client, get_text, Headline, HeadlineWindow, SentimentSource, SourceError, SourceKind,
};

/// Free-tier accounts only see roughly the last month
pub const FREE_TIER_HISTORY_DAYS: i64 = 29;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: DateTime<Utc>,
}

pub struct NewsApiSource {
    api_key: Option<String>,
    base_url: String,
    max_history_days: Option<i64>,
    client: Client,
}

impl NewsApiSource {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        max_history_days: Option<i64>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url
                .unwrap_or_else(|| SourceKind::NewsApi.default_base_url().to_string()),
            max_history_days,
            client: build_client(timeout)?,
        })
    }

    /// Fail fast for windows older than the account's history
    fn check_history(&self, window: &HeadlineWindow, today: NaiveDate) -> Result<(), SourceError> {
        if let Some(days) = self.max_history_days {
            // a horizon reaching before the calendar's start limits nothing
            let earliest = u64::try_from(days)
                .ok()
                .and_then(|d| today.checked_sub_days(Days::new(d)));
            if earliest.is_some_and(|earliest| window.last_day() < earliest) {
                return Err(SourceError::OutsideHistory {
                    date: window.last_day(),
                    days,
                });
            }
        }
        Ok(())
    }
}

/// Search phrase for a symbol; bitcoin gets its common name as well
pub fn query_for(symbol: &Symbol) -> String {
    let coin = symbol.base_asset();
    if coin.eq_ignore_ascii_case("BTC") {
        format!("{} OR bitcoin OR cryptocurrency", coin)
    } else {
        format!("{} OR cryptocurrency", coin)
    }
}

impl SentimentSource for NewsApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::NewsApi
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch_headlines(
        &self,
        symbol: &Symbol,
        window: &HeadlineWindow,
    ) -> Result<Vec<Headline>, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::NotConfigured)?;
        self.check_history(window, Utc::now().date_naive())?;

        let params = [
            ("q", query_for(symbol)),
            ("from", window.first_day().format("%Y-%m-%d").to_string()),
            ("to", window.last_day().format("%Y-%m-%d").to_string()),
            ("language", "en".to_string()),
            ("sortBy", "relevancy".to_string()),
            ("pageSize", "100".to_string()),
            ("apiKey", api_key.to_string()),
        ];

        debug!(source = "newsapi", symbol = %symbol, from = %window.first_day(), "Searching articles");
        let body = get_text(&self.client, &self.base_url, &params)?;
        parse_articles(&body, window)
    }
}

pub(crate) fn parse_articles(
    body: &str,
    window: &HeadlineWindow,
) -> Result<Vec<Headline>, SourceError> {
    let response: EverythingResponse = serde_json::from_str(body)?;
    if response.status != "ok" {
        return Err(SourceError::Parse(
            response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
        ));
    }

    let headlines: Vec<Headline> = response
        .articles
        .into_iter()
        .filter(|a| window.contains(a.published_at))
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            Some(Headline {
                title,
                published_at: a.published_at,
            })
        })
        .collect();

    if headlines.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(headlines)
}
