//! Backtesting engine
//!
//! Runs each strategy over the same price series with its own portfolio.
//! Strategies are independent: one that cannot run (not enough history for
//! its indicator, no sentiment supplied) is reported as unavailable and the
//! others still complete. Bad input (empty series, invalid decisions) fails
//! the whole run.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DcaError, DcaResult};
use crate::indicators;
use crate::metrics::{self, Summary};
use crate::portfolio::PortfolioState;
use crate::sentiment::SentimentScore;
use crate::strategies::{DayContext, Strategy};
use crate::{Action, Decision, IndicatorValue, Money, PriceSeries, Symbol};

/// Backtest engine
pub struct Backtester {
    strategies: Vec<Box<dyn Strategy>>,
    sentiment: Option<Vec<SentimentScore>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyRun {
    pub state: PortfolioState,
    pub decisions: Vec<Decision>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Completed(StrategyRun),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: String,
    pub label: String,
    pub outcome: StrategyOutcome,
}

impl StrategyReport {
    pub fn run(&self) -> Option<&StrategyRun> {
        match &self.outcome {
            StrategyOutcome::Completed(run) => Some(run),
            StrategyOutcome::Unavailable { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.run().map(|r| &r.summary)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub symbol: Symbol,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: usize,
    pub strategies: Vec<StrategyReport>,
}

impl BacktestReport {
    pub fn strategy(&self, name: &str) -> Option<&StrategyReport> {
        self.strategies.iter().find(|s| s.name == name)
    }
}

impl Backtester {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Backtester {
            strategies,
            sentiment: None,
        }
    }

    /// Supply one sentiment score per date for strategies that need it
    pub fn with_sentiment(mut self, scores: Vec<SentimentScore>) -> Self {
        self.sentiment = Some(scores);
        self
    }

    pub fn needs_sentiment(&self) -> bool {
        self.strategies.iter().any(|s| s.needs_sentiment())
    }

    /// Run every strategy over `series`
    pub fn run(&self, series: &PriceSeries) -> DcaResult<BacktestReport> {
        let bars = series.bars();
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(DcaError::EmptySeries {
                symbol: series.symbol().to_string(),
            });
        };

        info!(
            symbol = %series.symbol(),
            start = %first.date,
            end = %last.date,
            bars = bars.len(),
            "Running backtest for {} strategies",
            self.strategies.len()
        );

        let sentiment: Option<HashMap<NaiveDate, &SentimentScore>> = self
            .sentiment
            .as_ref()
            .map(|scores| scores.iter().map(|s| (s.date, s)).collect());

        let mut rsi_cache: HashMap<usize, Result<Vec<IndicatorValue>, String>> = HashMap::new();

        let mut reports = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let rsi = match strategy.rsi_period() {
                Some(period) => {
                    let values = rsi_cache
                        .entry(period)
                        .or_insert_with(|| rsi_for(series, period));
                    match values {
                        Ok(values) => Some(values.as_slice()),
                        Err(reason) => {
                            reports.push(unavailable(strategy.as_ref(), reason.clone()));
                            continue;
                        }
                    }
                }
                None => None,
            };

            if strategy.needs_sentiment() && sentiment.is_none() {
                reports.push(unavailable(
                    strategy.as_ref(),
                    "no sentiment series supplied".to_string(),
                ));
                continue;
            }

            let run = simulate(strategy.as_ref(), series, rsi, sentiment.as_ref())?;
            info!(
                strategy = strategy.name(),
                invested = %run.summary.total_invested.round_dp(2),
                value = format!("{:.2}", run.summary.current_value),
                profit = format!("{:.2}", run.summary.profit()),
                buys = run.summary.buys,
                sells = run.summary.sells,
                "Strategy finished"
            );
            reports.push(StrategyReport {
                name: strategy.name().to_string(),
                label: strategy.label(),
                outcome: StrategyOutcome::Completed(run),
            });
        }

        Ok(BacktestReport {
            symbol: series.symbol().clone(),
            start: first.date,
            end: last.date,
            bars: bars.len(),
            strategies: reports,
        })
    }
}

/// RSI for a period, or the reason the indicator is unusable on this series
fn rsi_for(series: &PriceSeries, period: usize) -> Result<Vec<IndicatorValue>, String> {
    let values = indicators::rsi_series(series, period).map_err(|e| e.to_string())?;
    if values.iter().all(|v| v.rsi.is_none()) {
        return Err(format!(
            "RSI({}) needs more than {} bars, series has {}",
            period,
            period,
            series.len()
        ));
    }
    Ok(values)
}

fn unavailable(strategy: &dyn Strategy, reason: String) -> StrategyReport {
    warn!(strategy = strategy.name(), "Strategy unavailable: {}", reason);
    StrategyReport {
        name: strategy.name().to_string(),
        label: strategy.label(),
        outcome: StrategyOutcome::Unavailable { reason },
    }
}

fn simulate(
    strategy: &dyn Strategy,
    series: &PriceSeries,
    rsi: Option<&[IndicatorValue]>,
    sentiment: Option<&HashMap<NaiveDate, &SentimentScore>>,
) -> DcaResult<StrategyRun> {
    let bars = series.bars();
    let context = |i: usize, units_held: f64| DayContext {
        date: bars[i].date,
        close: bars[i].close,
        prev_date: i.checked_sub(1).map(|p| bars[p].date),
        rsi: rsi.and_then(|values| values[i].rsi),
        sentiment: sentiment.and_then(|scores| scores.get(&bars[i].date).copied()),
        units_held,
    };

    let mut state = PortfolioState::new();
    let mut decisions = Vec::with_capacity(bars.len());

    match strategy.monthly_budget() {
        Some(budget) => {
            // plan the whole run first; the rescale needs each month's total
            let planned: Vec<Decision> = (0..bars.len())
                .map(|i| strategy.decide(&context(i, 0.0)))
                .collect();
            for (decision, bar) in rebalance_monthly(&planned, budget).into_iter().zip(bars) {
                state.apply(&decision, bar.close)?;
                decisions.push(decision);
            }
        }
        None => {
            for (i, bar) in bars.iter().enumerate() {
                let decision = strategy.decide(&context(i, state.units_held));
                state.apply(&decision, bar.close)?;
                debug!(strategy = strategy.name(), date = %bar.date, "{}", decision.action);
                decisions.push(decision);
            }
        }
    }

    let summary = metrics::summarize(&state, &decisions);
    Ok(StrategyRun {
        state,
        decisions,
        summary,
    })
}

/// Rescale buys so each calendar month spends exactly `budget`.
///
/// Buys within a month keep their relative sizes. A month with no buys at
/// all invests the whole budget on its first day.
pub fn rebalance_monthly(decisions: &[Decision], budget: Money) -> Vec<Decision> {
    let mut result = Vec::with_capacity(decisions.len());

    for (_, month) in &decisions
        .iter()
        .chunk_by(|d| (d.date.year(), d.date.month()))
    {
        let month: Vec<&Decision> = month.collect();
        let total: Money = month
            .iter()
            .filter_map(|d| match d.action {
                Action::Buy { amount } => Some(amount),
                _ => None,
            })
            .sum();

        if total.is_positive() {
            result.extend(month.into_iter().map(|d| match d.action {
                Action::Buy { amount } => Decision::buy(d.date, amount.scale(budget, total)),
                _ => *d,
            }));
        } else {
            result.extend(month.into_iter().enumerate().map(|(i, d)| {
                if i == 0 {
                    Decision::buy(d.date, budget)
                } else {
                    *d
                }
            }));
        }
    }

    result
}
