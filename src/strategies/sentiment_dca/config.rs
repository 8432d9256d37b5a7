//! Sentiment DCA Configuration

use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};
use crate::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentDcaConfig {
    /// Scores above this buy aggressively (default: 0.3)
    pub bullish: f64,

    /// Scores at or above this (up to `bullish`) buy the neutral amount;
    /// below it the strategy holds or sells (default: 0.0)
    pub neutral_threshold: f64,

    /// Scores below this sell part of the position (default: -0.3)
    pub bearish: f64,

    /// Amount bought on bullish days (default: 150)
    pub buy_bullish: Money,

    /// Amount bought on neutral-to-mildly-positive days (default: 100)
    pub buy_neutral: Money,

    /// Fraction of held units sold on bearish days (default: 0.2)
    pub sell_fraction: f64,
}

impl Default for SentimentDcaConfig {
    fn default() -> Self {
        Self {
            bullish: 0.3,
            neutral_threshold: 0.0,
            bearish: -0.3,
            buy_bullish: Money::from_i64(150),
            buy_neutral: Money::from_i64(100),
            sell_fraction: 0.2,
        }
    }
}

impl SentimentDcaConfig {
    pub fn validate(&self) -> DcaResult<()> {
        let ordered = (-1.0..=1.0).contains(&self.bearish)
            && self.bearish <= self.neutral_threshold
            && self.neutral_threshold <= self.bullish
            && self.bullish <= 1.0;
        if !ordered {
            return Err(DcaError::InvalidConfig(format!(
                "sentiment_dca needs -1 <= bearish <= neutral_threshold <= bullish <= 1, got {} / {} / {}",
                self.bearish, self.neutral_threshold, self.bullish
            )));
        }
        if !(0.0..=1.0).contains(&self.sell_fraction) {
            return Err(DcaError::InvalidFraction(self.sell_fraction));
        }
        for amount in [self.buy_bullish, self.buy_neutral] {
            if amount.is_negative() {
                return Err(DcaError::NegativeAmount(amount));
            }
        }
        Ok(())
    }
}
