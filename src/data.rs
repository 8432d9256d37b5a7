//! Data loading
//!
//! Reads a finished daily close series from CSV. Works with the usual
//! market-data exports: a `Date`/`datetime` column plus `Adj Close` or
//! `Close` (header matching ignores case, spaces and underscores).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{info, warn};

use crate::{PriceBar, PriceSeries, Symbol};

// =============================================================================
// CSV Data Loading
// =============================================================================

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

/// Parse a date from the common CSV formats (date only, datetime, RFC 3339)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Load daily closes for `symbol` from a CSV file.
///
/// Rows whose close is missing or not a number (exports often write `null`
/// for holidays) are skipped with a warning. Rows are sorted by date; a
/// duplicated date is an error.
pub fn load_price_csv(path: impl AsRef<Path>, symbol: &Symbol) -> Result<PriceSeries> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(normalize_header)
        .collect();
    let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

    let date_col = find(&["date", "datetime", "timestamp"])
        .context("CSV has no date column (expected date or datetime)")?;
    let close_col = find(&["adjclose"])
        .or_else(|| find(&["close"]))
        .context("CSV has no close column (expected adj close or close)")?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let date_str = record.get(date_col).context("Missing date column")?;
        let date = parse_date(date_str)
            .with_context(|| format!("Failed to parse date on row {}: {}", row_idx + 1, date_str))?;

        let close = match record.get(close_col).map(str::trim).map(str::parse::<f64>) {
            Some(Ok(close)) if close.is_finite() && close > 0.0 => close,
            _ => {
                skipped += 1;
                continue;
            }
        };

        bars.push(PriceBar { date, close });
    }

    if skipped > 0 {
        warn!("Skipped {} rows without a usable close in {}", skipped, path.display());
    }
    if bars.is_empty() {
        bail!("No price data in {}", path.display());
    }

    bars.sort_by_key(|b| b.date);
    let series = PriceSeries::new(symbol.clone(), bars)
        .with_context(|| format!("Invalid price data in {}", path.display()))?;

    info!(
        "Loaded {} daily closes for {} ({} to {})",
        series.len(),
        symbol,
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

/// Trim to a trailing lookback window, or keep everything for `None`
pub fn apply_lookback(series: PriceSeries, years: Option<u32>) -> Result<PriceSeries> {
    match years {
        Some(years) => {
            let trimmed = series.last_years(years)?;
            info!(
                "Using last {} year(s): {} bars from {}",
                years,
                trimmed.len(),
                trimmed.first_date()
            );
            Ok(trimmed)
        }
        None => Ok(series),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("2024-03-01 00:00:00"), expected);
        assert_eq!(parse_date("2024-03-01T00:00:00+00:00"), expected);
        assert_eq!(parse_date("03/01/2024"), None);
    }

    #[test]
    fn test_load_prefers_adjusted_close() {
        let file = csv_file(
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-02,1,1,1,100.0,99.0,10\n\
             2024-01-01,1,1,1,90.0,89.0,10\n\
             2024-01-03,1,1,1,null,null,0\n",
        );

        let series = load_price_csv(file.path(), &Symbol::new("BTC-USD")).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series.closes(), vec![89.0, 99.0]);
    }

    #[test]
    fn test_load_plain_close_column() {
        let file = csv_file("datetime,close\n2024-01-01 00:00:00,42000.5\n2024-01-02 00:00:00,43000\n");
        let series = load_price_csv(file.path(), &Symbol::new("BTC-USD")).unwrap();
        assert_eq!(series.closes(), vec![42000.5, 43000.0]);
    }

    #[test]
    fn test_load_errors() {
        let no_close = csv_file("date,volume\n2024-01-01,5\n");
        assert!(load_price_csv(no_close.path(), &Symbol::new("X")).is_err());

        let empty = csv_file("date,close\n");
        assert!(load_price_csv(empty.path(), &Symbol::new("X")).is_err());

        let duplicate = csv_file("date,close\n2024-01-01,1\n2024-01-01,2\n");
        assert!(load_price_csv(duplicate.path(), &Symbol::new("X")).is_err());
    }

    #[test]
    fn test_apply_lookback() {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let series = PriceSeries::from_closes(
            Symbol::new("BTC-USD"),
            (0..3000).map(|i| (start + chrono::Duration::days(i), 100.0)),
        )
        .unwrap();

        let all = apply_lookback(series.clone(), None).unwrap();
        assert_eq!(all.len(), 3000);
        let one_year = apply_lookback(series, Some(1)).unwrap();
        assert_eq!(one_year.len(), 371);
    }
}
