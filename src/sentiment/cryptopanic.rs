//! CryptoPanic posts API (free and pro tiers)

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::Symbol;

use super::source::{
    build_client, get_text, Headline, HeadlineWindow, SentimentSource, SourceError, SourceKind,
};

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
}

pub struct CryptoPanicSource {
    kind: SourceKind,
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl CryptoPanicSource {
    /// `kind` selects the tier and must be one of the two CryptoPanic kinds
    pub fn new(
        kind: SourceKind,
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if !matches!(kind, SourceKind::CryptoPanic | SourceKind::CryptoPanicPro) {
            bail!("{} is not a CryptoPanic tier", kind);
        }

        Ok(Self {
            kind,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.unwrap_or_else(|| kind.default_base_url().to_string()),
            client: build_client(timeout)?,
        })
    }
}

impl SentimentSource for CryptoPanicSource {
    fn kind(&self) -> SourceKind {
        self.kind
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

        let params = [
            ("auth_token", api_key.to_string()),
            ("currencies", symbol.base_asset().to_string()),
            ("filter", "important".to_string()),
            ("public", "true".to_string()),
        ];

        debug!(source = %self.kind, symbol = %symbol, "Fetching posts");
        let body = get_text(&self.client, &self.base_url, &params)?;
        parse_posts(&body, window)
    }
}

/// Posts with a title published inside `window`
pub(crate) fn parse_posts(body: &str, window: &HeadlineWindow) -> Result<Vec<Headline>, SourceError> {
    let response: PostsResponse = serde_json::from_str(body)?;

    let headlines: Vec<Headline> = response
        .results
        .into_iter()
        .filter(|p| !p.title.trim().is_empty() && window.contains(p.published_at))
        .map(|p| Headline {
            title: p.title,
            published_at: p.published_at,
        })
        .collect();

    if headlines.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(headlines)
}
