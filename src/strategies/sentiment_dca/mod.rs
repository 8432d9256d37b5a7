//! Sentiment-Driven DCA
//!
//! Sizes buys by the day's news sentiment and trims the position when the
//! news turns clearly negative.

mod config;
mod strategy;

pub use config::SentimentDcaConfig;
pub use strategy::SentimentDcaStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    config.sentiment_dca.validate()?;
    Ok(Box::new(SentimentDcaStrategy::new(config.sentiment_dca.clone())))
}
