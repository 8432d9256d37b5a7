//! SIP Strategy

use crate::strategies::{DayContext, Strategy};
use crate::{starts_new_month, Decision, Money};

use super::config::SipConfig;

pub struct SipStrategy {
    config: SipConfig,
}

impl SipStrategy {
    pub fn new(config: SipConfig) -> Self {
        Self { config }
    }

    pub fn amount(&self) -> Money {
        self.config.amount
    }
}

impl Strategy for SipStrategy {
    fn name(&self) -> &'static str {
        "sip"
    }

    fn label(&self) -> String {
        format!("SIP (${}/month)", self.config.amount.round_dp(2))
    }

    fn decide(&self, ctx: &DayContext<'_>) -> Decision {
        // first bar of the month, whether or not the 1st traded
        if starts_new_month(ctx.date, ctx.prev_date) {
            Decision::buy(ctx.date, self.config.amount)
        } else {
            Decision::hold(ctx.date)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use chrono::{Duration, NaiveDate};

    fn ctx(date: NaiveDate, prev_date: Option<NaiveDate>) -> DayContext<'static> {
        DayContext {
            date,
            close: 100.0,
            prev_date,
            rsi: None,
            sentiment: None,
            units_held: 0.0,
        }
    }

    #[test]
    fn test_buys_once_per_month() {
        let strategy = SipStrategy::new(SipConfig::default());
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..366).map(|i| start + Duration::days(i)).collect();

        let mut buys = Vec::new();
        let mut prev = None;
        for date in &dates {
            let decision = strategy.decide(&ctx(*date, prev));
            if let Action::Buy { amount } = decision.action {
                assert_eq!(amount, Money::from_i64(100));
                buys.push(*date);
            }
            prev = Some(*date);
        }

        assert_eq!(buys.len(), 12);
        assert!(buys.iter().all(|d| chrono::Datelike::day(d) == 1));
    }

    #[test]
    fn test_first_trading_day_when_first_is_missing() {
        let strategy = SipStrategy::new(SipConfig {
            amount: Money::from_i64(250),
        });
        let jan_31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let feb_5 = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        let feb_6 = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap();

        assert_eq!(
            strategy.decide(&ctx(feb_5, Some(jan_31))),
            Decision::buy(feb_5, Money::from_i64(250))
        );
        assert_eq!(strategy.decide(&ctx(feb_6, Some(feb_5))), Decision::hold(feb_6));
    }

    #[test]
    fn test_label() {
        assert_eq!(SipStrategy::new(SipConfig::default()).label(), "SIP ($100/month)");
    }
}
