//! Technical indicators
//!
//! Only what the strategies consume: Wilder-smoothed RSI and a trailing
//! percentage return used by the sentiment fallback.
//!
//! All functions are pure and align their output with the input series.

use crate::error::{DcaError, DcaResult};
use crate::{IndicatorValue, PriceSeries};

/// Default RSI look-back
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// RSI reported when a window contains no price movement at all
pub const NEUTRAL_RSI: f64 = 50.0;

// =============================================================================
// Momentum Indicators
// =============================================================================

/// Calculate RSI (Relative Strength Index) using Wilder's smoothing
///
/// The first average gain/loss is the simple mean of the first `period`
/// changes; after that:
/// avg = (prev_avg * (period - 1) + current) / period
///
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss). A window with losses of zero
/// gives 100, a window with no movement gives [`NEUTRAL_RSI`].
///
/// Output length equals input length; the first `period` entries are `None`
/// because `period` changes need `period + 1` prices.
pub fn rsi(closes: &[f64], period: usize) -> DcaResult<Vec<Option<f64>>> {
    if period == 0 {
        return Err(DcaError::InvalidPeriod(period));
    }
    if closes.len() < 2 {
        return Err(DcaError::SeriesTooShort {
            required: 2,
            actual: closes.len(),
        });
    }

    let mut result = vec![None; closes.len()];
    if closes.len() <= period {
        return Ok(result);
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().copied().map(gain).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().copied().map(loss).sum::<f64>() / period as f64;
    result[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // changes[i - 1] is the move into closes[i]
    for i in (period + 1)..closes.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        result[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(result)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            NEUTRAL_RSI
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }
}

/// RSI aligned with the dates of a price series
pub fn rsi_series(series: &PriceSeries, period: usize) -> DcaResult<Vec<IndicatorValue>> {
    let values = rsi(&series.closes(), period)?;
    Ok(series
        .bars()
        .iter()
        .zip(values)
        .map(|(bar, rsi)| IndicatorValue {
            date: bar.date,
            rsi,
        })
        .collect())
}

/// Percentage return (as a fraction) from `lookback` bars before `index` to `index`.
///
/// With fewer than `lookback` earlier bars the first bar is the base, so the
/// very first bar always returns 0.
pub fn trailing_return(closes: &[f64], index: usize, lookback: usize) -> Option<f64> {
    let current = *closes.get(index)?;
    let base = closes[index.saturating_sub(lookback)];
    if base <= 0.0 {
        return None;
    }
    Some(current / base - 1.0)
}

// =============================================================================
// Tests
// =============================================================================
