//! Sentiment DCA Strategy

use crate::strategies::{DayContext, Strategy};
use crate::Decision;

use super::config::SentimentDcaConfig;

pub struct SentimentDcaStrategy {
    config: SentimentDcaConfig,
}

impl SentimentDcaStrategy {
    pub fn new(config: SentimentDcaConfig) -> Self {
        Self { config }
    }
}

impl Strategy for SentimentDcaStrategy {
    fn name(&self) -> &'static str {
        "sentiment_dca"
    }

    fn label(&self) -> String {
        "Sentiment DCA".to_string()
    }

    fn decide(&self, ctx: &DayContext<'_>) -> Decision {
        let Some(score) = ctx.sentiment else {
            return Decision::hold(ctx.date);
        };

        let c = &self.config;
        let value = score.value;
        if value > c.bullish {
            Decision::buy(ctx.date, c.buy_bullish)
        } else if value >= c.neutral_threshold {
            Decision::buy(ctx.date, c.buy_neutral)
        } else if value >= c.bearish {
            Decision::hold(ctx.date)
        } else if ctx.units_held > 0.0 {
            Decision::sell(ctx.date, c.sell_fraction)
        } else {
            // nothing to sell yet
            Decision::hold(ctx.date)
        }
    }

    fn needs_sentiment(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::{ScoreSource, SentimentScore};
    use crate::{Action, Money};
    use chrono::NaiveDate;

    fn decide(value: f64, units_held: f64) -> Action {
        decide_with(SentimentDcaConfig::default(), value, units_held)
    }

    fn decide_with(config: SentimentDcaConfig, value: f64, units_held: f64) -> Action {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let score = SentimentScore {
            date,
            value,
            source: ScoreSource::Fallback,
        };
        let ctx = DayContext {
            date,
            close: 100.0,
            prev_date: None,
            rsi: None,
            sentiment: Some(&score),
            units_held,
        };
        SentimentDcaStrategy::new(config).decide(&ctx).action
    }

    fn buy(amount: i64) -> Action {
        Action::Buy {
            amount: Money::from_i64(amount),
        }
    }

    #[test]
    fn test_sentiment_bands() {
        assert_eq!(decide(0.8, 0.0), buy(150));
        assert_eq!(decide(0.31, 0.0), buy(150));
        assert_eq!(decide(0.3, 0.0), buy(100));
        assert_eq!(decide(0.0, 0.0), buy(100));
        assert_eq!(decide(-0.01, 5.0), Action::Hold);
        assert_eq!(decide(-0.3, 5.0), Action::Hold);
        assert_eq!(decide(-0.5, 10.0), Action::Sell { fraction: 0.2 });
    }

    #[test]
    fn test_bearish_without_units_holds() {
        assert_eq!(decide(-0.9, 0.0), Action::Hold);
    }

    #[test]
    fn test_missing_score_holds() {
        let ctx = DayContext {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            close: 100.0,
            prev_date: None,
            rsi: None,
            sentiment: None,
            units_held: 3.0,
        };
        let strategy = SentimentDcaStrategy::new(SentimentDcaConfig::default());
        assert_eq!(strategy.decide(&ctx).action, Action::Hold);
    }

    #[test]
    fn test_validate_sell_fraction() {
        let config = SentimentDcaConfig {
            sell_fraction: 1.5,
            ..SentimentDcaConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SentimentDcaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_neutral_threshold_moves_buy_band() {
        let config = SentimentDcaConfig {
            neutral_threshold: 0.1,
            ..SentimentDcaConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(decide(0.05, 5.0), buy(100));
        assert_eq!(decide_with(config.clone(), 0.05, 5.0), Action::Hold);
        assert_eq!(decide_with(config, 0.1, 5.0), buy(100));

        let lowered = SentimentDcaConfig {
            neutral_threshold: -0.2,
            ..SentimentDcaConfig::default()
        };
        assert_eq!(decide_with(lowered, -0.1, 5.0), buy(100));
    }

    #[test]
    fn test_validate_threshold_order() {
        for (bearish, neutral, bullish) in [(-0.3, 0.4, 0.3), (0.1, 0.0, 0.3), (-0.3, 0.0, 1.5)] {
            let config = SentimentDcaConfig {
                bearish,
                neutral_threshold: neutral,
                bullish,
                ..SentimentDcaConfig::default()
            };
            assert!(config.validate().is_err(), "{} {} {}", bearish, neutral, bullish);
        }
    }
}
