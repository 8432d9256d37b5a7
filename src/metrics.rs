//! Performance metrics for a finished strategy run

use serde::{Deserialize, Serialize};

use crate::portfolio::{EquityPoint, PortfolioState};
use crate::{Decision, Money};

/// Summary statistics for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_invested: Money,
    pub current_value: f64,
    pub units_held: f64,
    /// `None` when nothing was invested
    pub roi_pct: Option<f64>,
    /// Largest peak-to-trough decline, as a non-positive percentage
    pub max_drawdown_pct: f64,
    pub buys: usize,
    pub sells: usize,
}

impl Summary {
    pub fn profit(&self) -> f64 {
        self.current_value - self.total_invested.to_f64()
    }
}

/// ROI in percent, undefined for a zero investment
pub fn roi_pct(total_invested: Money, current_value: f64) -> Option<f64> {
    if total_invested.is_zero() {
        return None;
    }
    let invested = total_invested.to_f64();
    Some((current_value - invested) / invested * 100.0)
}

/// Maximum drawdown in percent (<= 0).
///
/// Days where the running peak is not positive contribute 0, so a curve that
/// starts at zero before the first buy is not penalised.
pub fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for point in curve {
        peak = peak.max(point.value);
        if peak > 0.0 {
            worst = worst.min((point.value - peak) / peak);
        }
    }

    worst * 100.0
}

pub fn summarize(state: &PortfolioState, decisions: &[Decision]) -> Summary {
    let current_value = state.current_value();
    Summary {
        total_invested: state.cash_invested,
        current_value,
        units_held: state.units_held,
        roi_pct: roi_pct(state.cash_invested, current_value),
        max_drawdown_pct: max_drawdown_pct(&state.equity_curve),
        buys: decisions.iter().filter(|d| d.action.is_buy()).count(),
        sells: decisions.iter().filter(|d| d.action.is_sell()).count(),
    }
}
