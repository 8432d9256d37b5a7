//! Fixed-Schedule DCA (SIP)
//!
//! Invests a fixed amount on the first trading day of every month.

mod config;
mod strategy;

pub use config::SipConfig;
pub use strategy::SipStrategy;

use crate::strategies::Strategy;
use crate::Config;
use anyhow::Result;

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    config.sip.validate()?;
    Ok(Box::new(SipStrategy::new(config.sip.clone())))
}
