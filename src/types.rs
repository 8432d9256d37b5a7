//! Core data types used across the backtester

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};

/// Asset symbol as supplied by the market-data provider (e.g. `BTC-USD`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coin ticker without the quote currency: `BTC-USD` -> `BTC`
    pub fn base_asset(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    /// Create a bar, rejecting non-positive or non-finite closes
    pub fn new(date: NaiveDate, close: f64) -> DcaResult<Self> {
        if !close.is_finite() || close <= 0.0 {
            return Err(DcaError::NonPositivePrice { date, close });
        }
        Ok(PriceBar { date, close })
    }
}

/// Validated daily close series for a single symbol.
///
/// Dates are unique and strictly ascending; every close is positive.
/// Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: Symbol,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, bars: Vec<PriceBar>) -> DcaResult<Self> {
        if bars.is_empty() {
            return Err(DcaError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        for bar in &bars {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(DcaError::NonPositivePrice {
                    date: bar.date,
                    close: bar.close,
                });
            }
        }

        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(DcaError::UnorderedDates {
                symbol: symbol.to_string(),
                date: w[1].date,
            });
        }

        Ok(PriceSeries { symbol, bars })
    }

    /// Convenience constructor from `(date, close)` pairs
    pub fn from_closes(
        symbol: Symbol,
        closes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> DcaResult<Self> {
        let bars = closes
            .into_iter()
            .map(|(date, close)| PriceBar::new(date, close))
            .collect::<DcaResult<Vec<_>>>()?;
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: construction rejects empty series
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Position of `date` in the series
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Like `index_of`, but a missing date is a fatal range error
    pub fn require_index(&self, date: NaiveDate) -> DcaResult<usize> {
        self.index_of(date).ok_or(DcaError::DateOutOfRange {
            date,
            first: self.first_date(),
            last: self.last_date(),
        })
    }

    /// Keep only bars within `[start, end]`
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> DcaResult<Self> {
        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .copied()
            .collect();
        Self::new(self.symbol.clone(), bars)
    }

    /// Trailing lookback window of `years` ending at the last bar
    /// (`years * 365 + 5` calendar days, so a full year of daily bars is never cut short)
    pub fn last_years(&self, years: u32) -> DcaResult<Self> {
        if years == 0 {
            return Err(DcaError::InvalidConfig(
                "lookback must be at least one year".to_string(),
            ));
        }
        let end = self.last_date();
        let start = end - chrono::Duration::days(i64::from(years) * 365 + 5);
        self.between(start, end)
    }
}

/// RSI value aligned with a price bar; `None` during warm-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub date: NaiveDate,
    pub rsi: Option<f64>,
}

/// True when `date` and `prev` fall in different calendar months
pub fn starts_new_month(date: NaiveDate, prev: Option<NaiveDate>) -> bool {
    match prev {
        None => true,
        Some(p) => (p.year(), p.month()) != (date.year(), date.month()),
    }
}

/// What a strategy wants done on a given day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Invest `amount` of currency at the day's close
    Buy { amount: Money },
    /// Release `fraction` of the units currently held
    Sell { fraction: f64 },
    Hold,
    /// Deliberate stand-aside (overbought); applied exactly like `Hold`
    Wait,
}

impl Action {
    pub fn is_buy(&self) -> bool {
        matches!(self, Action::Buy { .. })
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Action::Sell { .. })
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy { amount } => write!(f, "BUY ${}", amount.round_dp(2)),
            Action::Sell { fraction } => write!(f, "SELL {:.0}%", fraction * 100.0),
            Action::Hold => write!(f, "HOLD"),
            Action::Wait => write!(f, "WAIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub date: NaiveDate,
    pub action: Action,
}

impl Decision {
    pub fn buy(date: NaiveDate, amount: Money) -> Self {
        Decision {
            date,
            action: Action::Buy { amount },
        }
    }

    pub fn sell(date: NaiveDate, fraction: f64) -> Self {
        Decision {
            date,
            action: Action::Sell { fraction },
        }
    }

    pub fn hold(date: NaiveDate) -> Self {
        Decision {
            date,
            action: Action::Hold,
        }
    }

    pub fn wait(date: NaiveDate) -> Self {
        Decision {
            date,
            action: Action::Wait,
        }
    }
}

// ============================================================================
// Money Type - Precise Decimal Arithmetic for Monetary Values
// ============================================================================

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Currency amount backed by `rust_decimal::Decimal`.
///
/// Cumulative capital deployed is summed in decimal so a ten-year SIP of $100
/// per month totals exactly $12,000 rather than drifting in binary floating point.
///
/// # Example
/// ```
/// use dca_backtester::Money;
/// let monthly = Money::from_f64(100.0);
/// let total: Money = std::iter::repeat(monthly).take(120).sum();
/// assert_eq!(total.to_f64(), 12_000.0);
/// ```
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero value
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub const fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    /// Create from f64. NaN and infinities collapse to zero.
    pub fn from_f64(value: f64) -> Self {
        Money(Decimal::try_from(value).unwrap_or_else(|_| {
            if value.is_nan() || value.is_infinite() {
                Decimal::ZERO
            } else {
                Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
            }
        }))
    }

    /// Convert to f64 for unit and ratio calculations
    pub fn to_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn from_i64(value: i64) -> Self {
        Money(Decimal::from(value))
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Round to specified decimal places
    pub fn round_dp(self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// Scale by `numerator / denominator`; a zero denominator yields zero
    pub fn scale(self, numerator: Money, denominator: Money) -> Self {
        if denominator.is_zero() {
            Money::ZERO
        } else {
            Money(self.0 * numerator.0 / denominator.0)
        }
    }

    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::hash::Hash for Money {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Mul for Money {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Money(self.0 * rhs.0)
    }
}

impl From<f64> for Money {
    fn from(value: f64) -> Self {
        Money::from_f64(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money::from_i64(value)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}
