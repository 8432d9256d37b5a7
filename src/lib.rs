//! DCA Backtester
//!
//! Compares recurring-purchase strategies for a crypto asset over a
//! historical daily close series:
//!
//! - **SIP**: fixed amount on the first trading day of every month
//! - **RSI DCA**: buy size driven by Wilder RSI bands
//! - **Sentiment DCA**: buy size (or a partial sell) driven by daily news
//!   sentiment, with a deterministic price-momentum fallback when no news
//!   source can answer
//!
//! Each strategy owns its portfolio; results are summarised as invested
//! capital, current value, ROI and maximum drawdown.

pub mod backtest;
pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod report;
pub mod sentiment;
pub mod strategies;
pub mod types;

pub use config::{Config, Credentials};
pub use error::{DcaError, DcaResult};
pub use strategies::Strategy;
pub use types::*;
