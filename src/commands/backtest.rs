//! Backtest command implementation

use anyhow::{Context, Result};
use dca_backtester::sentiment::{SentimentProvider, SentimentScore};
use dca_backtester::strategies::{self, available_strategies};
use dca_backtester::{backtest::Backtester, data, report, Config, Credentials, PriceSeries};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info};

/// Command-line overrides on top of the config file
#[derive(Debug, Default)]
pub struct BacktestArgs {
    pub config: Option<String>,
    pub data: Option<String>,
    pub symbol: Option<String>,
    pub years: Option<u32>,
    pub strategies: Option<String>,
    pub offline: bool,
    pub monthly_budget: bool,
    pub output: Option<String>,
}

pub fn run(args: BacktestArgs) -> Result<()> {
    info!("Starting backtest");

    let config = load_config(&args)?;

    let symbol = config.backtest.symbol();
    let data_path = config.backtest.data_path();
    info!("Loading data from: {}", data_path.display());
    let series = data::load_price_csv(&data_path, &symbol)?;
    let series = data::apply_lookback(series, config.backtest.years)?;

    info!("Creating strategies: {}", config.backtest.strategies.join(", "));
    let strategies = strategies::create_strategies(&config)?;
    let mut backtester = Backtester::new(strategies);

    if backtester.needs_sentiment() {
        let provider = SentimentProvider::from_config(&config.sentiment, &Credentials::from_env())?;
        let scores = resolve_sentiment(&provider, &series)?;
        backtester = backtester.with_sentiment(scores);
    }

    info!("Running backtest...");
    let result = backtester.run(&series)?;

    println!("{}", report::render_summary(&result));

    let results_dir = Path::new(&config.backtest.results_dir);
    let stem = format!("{}_{}_{}", symbol, result.start, result.end);
    let equity_path = results_dir.join(format!("{}_equity.csv", stem));
    let json_path = results_dir.join(format!("{}.json", stem));

    report::write_equity_csv(&result, &equity_path)?;
    report::write_json(&result, &json_path)?;
    info!("Equity curves written to: {}", equity_path.display());
    info!("Report written to: {}", json_path.display());

    info!("Backtest completed successfully");
    Ok(())
}

fn load_config(args: &BacktestArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path);
            config
        }
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    // Apply overrides
    if let Some(data) = &args.data {
        info!("Overriding data file to: {}", data);
        config.backtest.data_file = Some(data.clone());
    }

    if let Some(symbol) = &args.symbol {
        info!("Overriding symbol to: {}", symbol);
        config.backtest.symbol = symbol.clone();
    }

    if let Some(years) = args.years {
        info!("Overriding lookback to: {} year(s)", years);
        config.backtest.years = Some(years);
    }

    if let Some(list) = &args.strategies {
        let names: Vec<String> = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        info!("Overriding strategies to: {}", names.join(", "));
        config.backtest.strategies = names;
    }

    if args.offline {
        info!("Offline mode: news sources disabled");
        config.sentiment.use_real_news = false;
    }

    if args.monthly_budget {
        info!("RSI DCA will match the SIP monthly budget");
        config.rsi_dca.match_monthly_budget = true;
    }

    if let Some(output) = &args.output {
        config.backtest.results_dir = output.clone();
    }

    config.validate().with_context(|| {
        format!(
            "Invalid configuration (available strategies: {})",
            available_strategies().join(", ")
        )
    })?;
    debug!("Effective config: {:?}", config);

    Ok(config)
}

/// One sentiment score per bar, with a progress bar since news lookups are slow
fn resolve_sentiment(provider: &SentimentProvider, series: &PriceSeries) -> Result<Vec<SentimentScore>> {
    info!("Resolving sentiment for {} days", series.len());

    let pb = ProgressBar::new(series.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut scores = Vec::with_capacity(series.len());
    let mut from_news = 0usize;
    for bar in series.bars() {
        let score = provider.get_sentiment(series, bar.date)?;
        if !score.source.is_fallback() {
            from_news += 1;
        }
        scores.push(score);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    info!(
        "Sentiment resolved: {} from news, {} from price momentum",
        from_news,
        scores.len() - from_news
    );
    Ok(scores)
}
