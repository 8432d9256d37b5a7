//! DCA Strategies Module
//!
//! Strategy framework with:
//! - One trait every investment policy implements
//! - Dynamic strategy registry (no hardcoded names in the backtester)
//! - Per-strategy config structs with thresholds and amounts as parameters

pub mod rsi_dca;
pub mod sentiment_dca;
pub mod sip;

use crate::sentiment::SentimentScore;
use crate::{Config, Decision, Money};
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

// =============================================================================
// Day Context - everything a policy may look at for one simulated date
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DayContext<'a> {
    pub date: NaiveDate,
    pub close: f64,
    /// Previous bar's date; `None` on the first bar of the run
    pub prev_date: Option<NaiveDate>,
    /// RSI for this date at the strategy's own period, if defined
    pub rsi: Option<f64>,
    pub sentiment: Option<&'a SentimentScore>,
    /// Units this strategy's portfolio holds before today's decision
    pub units_held: f64,
}

// =============================================================================
// Strategy Trait - The contract all strategies must implement
// =============================================================================

/// Investment policy: turns one day's inputs into a decision.
///
/// Strategies are pure; portfolio state is owned by the simulator.
pub trait Strategy: Send + Sync {
    /// Registry identifier (matches the config section name)
    fn name(&self) -> &'static str;

    /// Human-readable name for reports
    fn label(&self) -> String;

    fn decide(&self, ctx: &DayContext<'_>) -> Decision;

    /// RSI period this strategy reads (default: none)
    fn rsi_period(&self) -> Option<usize> {
        None
    }

    /// Whether a sentiment series is required (default: false)
    fn needs_sentiment(&self) -> bool {
        false
    }

    /// When set, each month's buys are rescaled to spend exactly this amount
    fn monthly_budget(&self) -> Option<Money> {
        None
    }
}

// =============================================================================
// Strategy Factory - Type alias for strategy constructor functions
// =============================================================================

/// Factory function type for creating strategies from config
pub type StrategyFactory = fn(&Config) -> Result<Box<dyn Strategy>>;

// =============================================================================
// Strategy Registry - Dynamic registration without hardcoding
// =============================================================================

static REGISTRY: OnceLock<RwLock<HashMap<&'static str, StrategyFactory>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<&'static str, StrategyFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert("sip", sip::create as StrategyFactory);
        map.insert("rsi_dca", rsi_dca::create as StrategyFactory);
        map.insert("sentiment_dca", sentiment_dca::create as StrategyFactory);
        RwLock::new(map)
    })
}

/// Create a strategy by registry name
pub fn create_strategy(name: &str, config: &Config) -> Result<Box<dyn Strategy>> {
    let registry = get_registry().read().unwrap_or_else(PoisonError::into_inner);

    let factory = registry.get(name).ok_or_else(|| {
        let mut available: Vec<_> = registry.keys().copied().collect();
        available.sort_unstable();
        anyhow::anyhow!(
            "Unknown strategy: '{}'. Available: {}",
            name,
            available.join(", ")
        )
    })?;

    factory(config)
}

/// Create every strategy named in `config.backtest.strategies`, in order
pub fn create_strategies(config: &Config) -> Result<Vec<Box<dyn Strategy>>> {
    config
        .backtest
        .strategies
        .iter()
        .map(|name| create_strategy(name, config))
        .collect()
}

/// Get list of available strategy names, sorted
pub fn available_strategies() -> Vec<&'static str> {
    let mut names: Vec<_> = get_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .copied()
        .collect();
    names.sort_unstable();
    names
}

/// Register a new strategy (for plugins or testing)
pub fn register_strategy(name: &'static str, factory: StrategyFactory) {
    get_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name, factory);
}
