//! Price-momentum stand-in for news sentiment
//!
//! Used when no news source can answer for a date. Deterministic: the same
//! series and date always give the same score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DcaError, DcaResult};
use crate::indicators::trailing_return;
use crate::PriceSeries;

use super::{ScoreSource, SentimentScore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Bars of trailing return to look at
    pub lookback_days: usize,
    /// Return magnitude that maps to a full +/-1 score
    pub scale: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            scale: 0.15,
        }
    }
}

impl FallbackConfig {
    pub fn validate(&self) -> DcaResult<()> {
        if self.lookback_days == 0 {
            return Err(DcaError::InvalidConfig(
                "fallback lookback_days must be positive".to_string(),
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(DcaError::InvalidConfig(format!(
                "fallback scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Trailing return over `lookback_days`, clamped to +/-`scale` and divided
/// by it. The first bars of a series use the earliest close as their base.
pub fn momentum_score(
    series: &PriceSeries,
    date: NaiveDate,
    config: &FallbackConfig,
) -> DcaResult<f64> {
    config.validate()?;
    let index = series.require_index(date)?;
    let start = index.saturating_sub(config.lookback_days);

    let window: Vec<f64> = series.bars()[start..=index].iter().map(|b| b.close).collect();
    let ret = trailing_return(&window, window.len() - 1, config.lookback_days).unwrap_or(0.0);

    Ok(ret.clamp(-config.scale, config.scale) / config.scale)
}

pub fn fallback_score(
    series: &PriceSeries,
    date: NaiveDate,
    config: &FallbackConfig,
) -> DcaResult<SentimentScore> {
    Ok(SentimentScore {
        date,
        value: momentum_score(series, date, config)?,
        source: ScoreSource::Fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_closes(
            Symbol::new("BTC-USD"),
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| (start + Duration::days(i as i64), *c)),
        )
        .unwrap()
    }

    #[test]
    fn test_score_scales_trailing_return() {
        // 7-bar return of +7.5% -> half of the 15% scale
        let mut closes = vec![100.0; 7];
        closes.push(107.5);
        let s = series(&closes);
        let score = momentum_score(&s, s.last_date(), &FallbackConfig::default()).unwrap();
        assert_relative_eq!(score, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let s = series(&[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 200.0, 40.0]);
        let config = FallbackConfig::default();
        assert_eq!(momentum_score(&s, s.bars()[7].date, &config).unwrap(), 1.0);
        assert_eq!(momentum_score(&s, s.bars()[8].date, &config).unwrap(), -1.0);
    }

    #[test]
    fn test_short_history_uses_first_bar() {
        let s = series(&[100.0, 103.0]);
        let config = FallbackConfig::default();
        assert_eq!(momentum_score(&s, s.first_date(), &config).unwrap(), 0.0);
        assert_relative_eq!(
            momentum_score(&s, s.last_date(), &config).unwrap(),
            0.2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_deterministic_and_tagged() {
        let s = series(&[100.0, 98.0, 97.0, 99.0, 101.0, 95.0, 96.0, 94.0, 93.0]);
        let config = FallbackConfig::default();
        let a = fallback_score(&s, s.last_date(), &config).unwrap();
        let b = fallback_score(&s, s.last_date(), &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.source, ScoreSource::Fallback);
        assert!((-1.0..=1.0).contains(&a.value));
    }

    #[test]
    fn test_unknown_date_is_rejected() {
        let s = series(&[100.0, 101.0]);
        let missing = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(matches!(
            momentum_score(&s, missing, &FallbackConfig::default()),
            Err(DcaError::DateOutOfRange { .. })
        ));
    }
}
