//! RSI DCA Strategy

use crate::strategies::{DayContext, Strategy};
use crate::{Decision, Money};

use super::config::RsiDcaConfig;

pub struct RsiDcaStrategy {
    config: RsiDcaConfig,
}

impl RsiDcaStrategy {
    pub fn new(config: RsiDcaConfig) -> Self {
        Self { config }
    }
}

impl Strategy for RsiDcaStrategy {
    fn name(&self) -> &'static str {
        "rsi_dca"
    }

    fn label(&self) -> String {
        let base = format!("RSI DCA (RSI {})", self.config.period);
        match self.config.monthly_budget {
            Some(budget) => format!("{} budget ${}/month", base, budget.round_dp(2)),
            None => base,
        }
    }

    fn decide(&self, ctx: &DayContext<'_>) -> Decision {
        let Some(rsi) = ctx.rsi else {
            return Decision::hold(ctx.date);
        };

        let c = &self.config;
        if rsi < c.oversold {
            Decision::buy(ctx.date, c.buy_oversold)
        } else if rsi < c.weak {
            Decision::buy(ctx.date, c.buy_weak)
        } else if rsi <= c.overbought {
            Decision::hold(ctx.date)
        } else {
            Decision::wait(ctx.date)
        }
    }

    fn rsi_period(&self) -> Option<usize> {
        Some(self.config.period)
    }

    fn monthly_budget(&self) -> Option<Money> {
        self.config.monthly_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use chrono::NaiveDate;

    fn decide(strategy: &RsiDcaStrategy, rsi: Option<f64>) -> Action {
        let ctx = DayContext {
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            close: 100.0,
            prev_date: None,
            rsi,
            sentiment: None,
            units_held: 0.0,
        };
        strategy.decide(&ctx).action
    }

    fn buy(amount: i64) -> Action {
        Action::Buy {
            amount: Money::from_i64(amount),
        }
    }

    #[test]
    fn test_rsi_bands() {
        let s = RsiDcaStrategy::new(RsiDcaConfig::default());

        assert_eq!(decide(&s, None), Action::Hold);
        assert_eq!(decide(&s, Some(12.0)), buy(150));
        assert_eq!(decide(&s, Some(29.99)), buy(150));
        assert_eq!(decide(&s, Some(30.0)), buy(100));
        assert_eq!(decide(&s, Some(39.99)), buy(100));
        assert_eq!(decide(&s, Some(40.0)), Action::Hold);
        assert_eq!(decide(&s, Some(70.0)), Action::Hold);
        assert_eq!(decide(&s, Some(70.01)), Action::Wait);
    }

    #[test]
    fn test_custom_thresholds() {
        let s = RsiDcaStrategy::new(RsiDcaConfig {
            oversold: 20.0,
            weak: 50.0,
            overbought: 60.0,
            buy_oversold: Money::from_i64(500),
            buy_weak: Money::from_i64(50),
            ..RsiDcaConfig::default()
        });

        assert_eq!(decide(&s, Some(19.0)), buy(500));
        assert_eq!(decide(&s, Some(45.0)), buy(50));
        assert_eq!(decide(&s, Some(55.0)), Action::Hold);
        assert_eq!(decide(&s, Some(61.0)), Action::Wait);
    }

    #[test]
    fn test_invalid_config() {
        let inverted = RsiDcaConfig {
            oversold: 50.0,
            weak: 40.0,
            ..RsiDcaConfig::default()
        };
        assert!(inverted.validate().is_err());

        let zero_period = RsiDcaConfig {
            period: 0,
            ..RsiDcaConfig::default()
        };
        assert!(zero_period.validate().is_err());
    }
}
