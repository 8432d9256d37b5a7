//! Fatal error taxonomy for the simulation core
//!
//! Anything in here aborts the current call immediately; there is no retry.
//! Recoverable news-source failures live in `sentiment::SourceError` instead.

use chrono::NaiveDate;
use thiserror::Error;

use crate::Money;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DcaError {
    #[error("price series for {symbol} is empty")]
    EmptySeries { symbol: String },

    #[error("price series for {symbol} is not strictly ascending at {date}")]
    UnorderedDates { symbol: String, date: NaiveDate },

    #[error("close price must be positive and finite, got {close} on {date}")]
    NonPositivePrice { date: NaiveDate, close: f64 },

    #[error("indicator period must be positive, got {0}")]
    InvalidPeriod(usize),

    #[error("need at least {required} prices, got {actual}")]
    SeriesTooShort { required: usize, actual: usize },

    #[error("buy amount must be non-negative, got {0}")]
    NegativeAmount(Money),

    #[error("sell fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("{date} is outside the available price history ({first} to {last})")]
    DateOutOfRange {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("decision for {date} arrived after {last}; days must be applied in ascending order")]
    OutOfOrderDecision { date: NaiveDate, last: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DcaResult<T> = Result<T, DcaError>;
