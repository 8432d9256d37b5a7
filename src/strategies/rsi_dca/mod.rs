//! Indicator-Driven DCA
//!
//! Buys more when RSI says the market is oversold, less when it is merely
//! weak, and stands aside otherwise.

mod config;
mod strategy;

pub use config::RsiDcaConfig;
pub use strategy::RsiDcaStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    let mut strategy_config = config.rsi_dca.clone();
    if strategy_config.match_monthly_budget && strategy_config.monthly_budget.is_none() {
        strategy_config.monthly_budget = Some(config.sip.amount);
    }
    strategy_config.validate()?;
    Ok(Box::new(RsiDcaStrategy::new(strategy_config)))
}
