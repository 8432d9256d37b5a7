pub mod backtest;
pub mod sentiment;
