//! DCA backtester - main entry point
//!
//! This binary provides two subcommands:
//! - backtest: Run the configured strategies over a daily close series
//! - sentiment: Resolve news sentiment for a date or date range

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "dca-backtester")]
#[command(about = "Backtest SIP, RSI and sentiment-driven DCA strategies on crypto prices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategy backtest
    Backtest {
        /// Path to configuration file (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Daily close CSV (overrides config file)
        #[arg(short, long)]
        data: Option<String>,

        /// Symbol, e.g. BTC-USD (overrides config file)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Lookback in years: 1, 3, 5 or 10
        #[arg(short, long)]
        years: Option<u32>,

        /// Strategies to run (comma-separated). E.g., "sip,rsi_dca"
        #[arg(long)]
        strategies: Option<String>,

        /// Skip news sources and use the price-momentum sentiment only
        #[arg(long)]
        offline: bool,

        /// Scale RSI DCA buys so each month spends the SIP amount
        #[arg(long)]
        monthly_budget: bool,

        /// Output directory for the equity curve and JSON report
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show sentiment scores for a symbol
    Sentiment {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Daily close CSV (needed for date validation and the fallback)
        #[arg(short, long)]
        data: Option<String>,

        /// Symbol, e.g. BTC-USD
        #[arg(short, long)]
        symbol: Option<String>,

        /// First date (YYYY-MM-DD); defaults to the last date in the data
        #[arg(long)]
        from: Option<String>,

        /// Last date (YYYY-MM-DD); defaults to `from`
        #[arg(long)]
        to: Option<String>,

        /// Skip news sources and use the price-momentum sentiment only
        #[arg(long)]
        offline: bool,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Backtest { .. } => "backtest",
        Commands::Sentiment { .. } => "sentiment",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Backtest {
            config,
            data,
            symbol,
            years,
            strategies,
            offline,
            monthly_budget,
            output,
        } => commands::backtest::run(commands::backtest::BacktestArgs {
            config,
            data,
            symbol,
            years,
            strategies,
            offline,
            monthly_budget,
            output,
        }),

        Commands::Sentiment {
            config,
            data,
            symbol,
            from,
            to,
            offline,
        } => commands::sentiment::run(config, data, symbol, from, to, offline),
    }
}
