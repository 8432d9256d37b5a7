//! RSI DCA Configuration

use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};
use crate::indicators::DEFAULT_RSI_PERIOD;
use crate::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiDcaConfig {
    /// RSI period (default: 14)
    pub period: usize,

    /// Below this RSI the larger amount is bought (default: 30)
    pub oversold: f64,

    /// Below this RSI (and at or above `oversold`) the normal amount is bought (default: 40)
    pub weak: f64,

    /// Above this RSI the strategy explicitly waits (default: 70)
    pub overbought: f64,

    /// Amount bought when oversold (default: 150)
    pub buy_oversold: Money,

    /// Amount bought when weak (default: 100)
    pub buy_weak: Money,

    /// Rescale each month's buys to total the SIP amount (default: false)
    pub match_monthly_budget: bool,

    /// Explicit monthly budget; filled from the SIP amount when matching is on
    pub monthly_budget: Option<Money>,
}

impl Default for RsiDcaConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_RSI_PERIOD,
            oversold: 30.0,
            weak: 40.0,
            overbought: 70.0,
            buy_oversold: Money::from_i64(150),
            buy_weak: Money::from_i64(100),
            match_monthly_budget: false,
            monthly_budget: None,
        }
    }
}

impl RsiDcaConfig {
    pub fn validate(&self) -> DcaResult<()> {
        if self.period == 0 {
            return Err(DcaError::InvalidPeriod(self.period));
        }
        if !(self.oversold <= self.weak && self.weak <= self.overbought) {
            return Err(DcaError::InvalidConfig(format!(
                "rsi_dca thresholds must satisfy oversold <= weak <= overbought, got {} / {} / {}",
                self.oversold, self.weak, self.overbought
            )));
        }
        for amount in [self.buy_oversold, self.buy_weak]
            .into_iter()
            .chain(self.monthly_budget)
        {
            if amount.is_negative() {
                return Err(DcaError::NegativeAmount(amount));
            }
        }
        Ok(())
    }
}
