//! Wire types for the backtest service API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default starting capital, matching the service default
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// One progress update from a running backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Simulation date this update corresponds to
    pub date: NaiveDate,
    /// Fraction of the run completed, in [0, 1]
    pub progress: f64,
    /// Portfolio valuation on `date`
    pub portfolio_value: f64,
}

/// Final results record for a completed backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub strategy_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_trades: u64,
}

/// Request body for starting a backtest run
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

/// Metadata for one available strategy
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Split a comma-separated ticker entry into trimmed symbols.
///
/// Empty entries (e.g. from a trailing comma) are dropped.
pub fn parse_tickers(entry: &str) -> Vec<String> {
    entry
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
