//! Portfolio simulation
//!
//! One `PortfolioState` per strategy, mutated once per simulated day.
//! Buys convert currency to units at the day's close; sells release a
//! fraction of the units. Proceeds are not tracked as cash and
//! `cash_invested` only ever grows: it is the capital deployed, not the net
//! position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};
use crate::{Action, Decision, Money};

/// Mark-to-market value at one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash_invested: Money,
    pub units_held: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl PortfolioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one day's decision at `price`, then record the day's equity.
    ///
    /// Validation happens before any mutation, so a rejected decision
    /// leaves the state untouched.
    pub fn apply(&mut self, decision: &Decision, price: f64) -> DcaResult<()> {
        if !(price.is_finite() && price > 0.0) {
            return Err(DcaError::NonPositivePrice {
                date: decision.date,
                close: price,
            });
        }
        if let Some(last) = self.last_date() {
            if decision.date <= last {
                return Err(DcaError::OutOfOrderDecision {
                    date: decision.date,
                    last,
                });
            }
        }

        match decision.action {
            Action::Buy { amount } => {
                if amount.is_negative() {
                    return Err(DcaError::NegativeAmount(amount));
                }
                self.units_held += amount.to_f64() / price;
                self.cash_invested += amount;
            }
            Action::Sell { fraction } => {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(DcaError::InvalidFraction(fraction));
                }
                let released = self.units_held * fraction;
                self.units_held = (self.units_held - released).max(0.0);
            }
            Action::Hold | Action::Wait => {}
        }

        self.equity_curve.push(EquityPoint {
            date: decision.date,
            value: self.units_held * price,
        });
        Ok(())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.equity_curve.last().map(|p| p.date)
    }

    /// Last equity value, 0 before the first day
    pub fn current_value(&self) -> f64 {
        self.equity_curve.last().map_or(0.0, |p| p.value)
    }
}

/// Functional form of [`PortfolioState::apply`]
pub fn apply(mut state: PortfolioState, decision: &Decision, price: f64) -> DcaResult<PortfolioState> {
    state.apply(decision, price)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_buy_adds_units_and_cash() {
        let mut state = PortfolioState::new();
        state.apply(&Decision::buy(day(1), Money::from_i64(100)), 50.0).unwrap();

        assert_relative_eq!(state.units_held, 2.0);
        assert_eq!(state.cash_invested, Money::from_i64(100));
        assert_eq!(state.equity_curve, vec![EquityPoint { date: day(1), value: 100.0 }]);
    }

    #[test]
    fn test_sell_releases_fraction_without_reducing_cash() {
        let state = PortfolioState {
            cash_invested: Money::from_i64(1000),
            units_held: 10.0,
            equity_curve: Vec::new(),
        };
        let state = apply(state, &Decision::sell(day(2), 0.2), 100.0).unwrap();

        assert_relative_eq!(state.units_held, 8.0);
        assert_eq!(state.cash_invested, Money::from_i64(1000));
        assert_relative_eq!(state.current_value(), 800.0);
    }

    #[test]
    fn test_hold_and_wait_only_mark_to_market() {
        let mut state = PortfolioState::new();
        state.apply(&Decision::buy(day(1), Money::from_i64(100)), 100.0).unwrap();
        state.apply(&Decision::hold(day(2)), 110.0).unwrap();
        state.apply(&Decision::wait(day(3)), 90.0).unwrap();

        assert_relative_eq!(state.units_held, 1.0);
        let values: Vec<f64> = state.equity_curve.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 110.0, 90.0]);
    }

    #[test]
    fn test_rejects_invalid_decisions_without_mutation() {
        let mut state = PortfolioState::new();
        state.apply(&Decision::buy(day(2), Money::from_i64(100)), 100.0).unwrap();
        let before = state.clone();

        assert_eq!(
            state.apply(&Decision::buy(day(3), Money::from_i64(-5)), 100.0),
            Err(DcaError::NegativeAmount(Money::from_i64(-5)))
        );
        assert_eq!(
            state.apply(&Decision::sell(day(3), 1.5), 100.0),
            Err(DcaError::InvalidFraction(1.5))
        );
        assert!(matches!(
            state.apply(&Decision::hold(day(3)), 0.0),
            Err(DcaError::NonPositivePrice { .. })
        ));
        assert_eq!(
            state.apply(&Decision::hold(day(1)), 100.0),
            Err(DcaError::OutOfOrderDecision {
                date: day(1),
                last: day(2)
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_sell_everything() {
        let mut state = PortfolioState::new();
        state.apply(&Decision::buy(day(1), Money::from_i64(300)), 30.0).unwrap();
        state.apply(&Decision::sell(day(2), 1.0), 30.0).unwrap();
        assert_eq!(state.units_held, 0.0);
        assert_eq!(state.current_value(), 0.0);
    }
}
