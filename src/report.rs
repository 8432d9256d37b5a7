//! Report rendering and export
//!
//! Text summary for the terminal and an equity-curve CSV for charting.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::backtest::{BacktestReport, StrategyOutcome};
use crate::Money;

fn money(value: Money) -> String {
    format!("{:.2}", value.inner())
}

/// Per-strategy summary table
pub fn render_summary(report: &BacktestReport) -> String {
    let mut output = String::new();
    let width = 118;

    output.push_str(&format!("\n{}\n", "=".repeat(width)));
    output.push_str(&format!(
        "BACKTEST RESULTS: {} ({} to {}, {} days)\n",
        report.symbol, report.start, report.end, report.bars
    ));
    output.push_str(&format!("{}\n", "=".repeat(width)));
    output.push_str(&format!(
        "{:<36} │ {:>12} │ {:>14} │ {:>8} │ {:>9} │ {:>16} │ {:>4} │ {:>4}\n",
        "Strategy", "Invested", "Value", "ROI %", "Max DD %", "Units", "Buys", "Sells"
    ));
    output.push_str(&format!("{}\n", "─".repeat(width)));

    for strategy in &report.strategies {
        match &strategy.outcome {
            StrategyOutcome::Completed(run) => {
                let s = &run.summary;
                let roi = s
                    .roi_pct
                    .map_or_else(|| "N/A".to_string(), |r| format!("{:.2}", r));
                output.push_str(&format!(
                    "{:<36} │ {:>12} │ {:>14.2} │ {:>8} │ {:>9.2} │ {:>16.8} │ {:>4} │ {:>4}\n",
                    strategy.label,
                    money(s.total_invested),
                    s.current_value,
                    roi,
                    s.max_drawdown_pct,
                    s.units_held,
                    s.buys,
                    s.sells
                ));
            }
            StrategyOutcome::Unavailable { reason } => {
                output.push_str(&format!(
                    "{:<36} │ unavailable: {}\n",
                    strategy.label, reason
                ));
            }
        }
    }

    output.push_str(&format!("{}\n", "=".repeat(width)));
    output
}

/// Write every completed strategy's equity curve as `date,strategy,value`
pub fn write_equity_csv(report: &BacktestReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(["date", "strategy", "value"])?;
    for strategy in &report.strategies {
        let Some(run) = strategy.run() else {
            continue;
        };
        for point in &run.state.equity_curve {
            wtr.write_record([
                point.date.format("%Y-%m-%d").to_string(),
                strategy.name.clone(),
                format!("{:.2}", point.value),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Full report (summaries, decisions, curves) as pretty JSON
pub fn write_json(report: &BacktestReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
