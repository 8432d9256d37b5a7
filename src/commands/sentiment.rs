//! Sentiment command implementation

use anyhow::{Context, Result};
use dca_backtester::sentiment::SentimentProvider;
use dca_backtester::{data, Config, Credentials};
use tracing::info;

pub fn run(
    config_path: Option<String>,
    data_override: Option<String>,
    symbol_override: Option<String>,
    from: Option<String>,
    to: Option<String>,
    offline: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(symbol) = symbol_override {
        config.backtest.symbol = symbol;
    }
    if let Some(data) = data_override {
        config.backtest.data_file = Some(data);
    }
    if offline {
        config.sentiment.use_real_news = false;
    }

    let symbol = config.backtest.symbol();
    let series = data::load_price_csv(config.backtest.data_path(), &symbol)?;

    let parse = |s: &str| {
        data::parse_date(s).with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", s))
    };
    let start = match from.as_deref() {
        Some(s) => parse(s)?,
        None => series.last_date(),
    };
    let end = match to.as_deref() {
        Some(s) => parse(s)?,
        None => start,
    };
    let window = series.between(start, end)?;

    let provider = SentimentProvider::from_config(&config.sentiment, &Credentials::from_env())?;
    info!("Resolving sentiment for {} from {} to {}", symbol, start, end);

    println!("\n{}", "=".repeat(60));
    if provider.uses_real_news() {
        println!("SENTIMENT: {}", symbol);
    } else {
        println!("SENTIMENT: {} (offline, price momentum only)", symbol);
    }
    println!("{}", "=".repeat(60));
    println!("{:<12} {:>8}  {}", "Date", "Score", "Source");
    for bar in window.bars() {
        // full series so the momentum fallback sees history before `start`
        let score = provider.get_sentiment(&series, bar.date)?;
        println!("{:<12} {:>8.3}  {}", score.date, score.value, score.source);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}
