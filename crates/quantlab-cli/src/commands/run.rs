//! `quantlab run` - start a backtest and follow its event stream
//!
//! Drives a `RunSession` off the event channel: progress lines while the
//! run simulates, then the results summary or the failure message. A
//! partial equity series survives a failure and is reported with it.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Args;
use quantlab_core::api::types::{parse_tickers, BacktestRequest, DEFAULT_INITIAL_CAPITAL};
use quantlab_core::session::{RunPhase, RunSession};
use quantlab_core::stream::BacktestEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;

#[derive(Args)]
pub struct RunArgs {
    /// Strategy id (see `quantlab strategies`)
    #[arg(long)]
    strategy: String,

    /// Comma-separated tickers, e.g. "AAPL, MSFT"
    #[arg(long)]
    tickers: String,

    /// Backtest start date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Backtest end date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Starting capital
    #[arg(long, default_value_t = DEFAULT_INITIAL_CAPITAL)]
    capital: f64,
}

pub async fn execute(config: &Config, args: RunArgs) -> Result<()> {
    let tickers = parse_tickers(&args.tickers);
    if tickers.is_empty() {
        bail!("no tickers given");
    }

    let request = BacktestRequest {
        strategy_id: args.strategy,
        tickers,
        start_date: args.start,
        end_date: args.end,
        initial_capital: args.capital,
    };

    debug!("requesting backtest run against {}", config.api_url);

    let client = config.client();
    let mut session = RunSession::new();
    let generation = session.begin_run();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let pump = tokio::spawn({
        let cancel = cancel.clone();
        async move { client.run_backtest(&request, tx, cancel).await }
    });

    // Ctrl-C stops the stream pump; the run surfaces as failed
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    // Events arrive in frame order; the channel closes when the pump stops
    while let Some(event) = rx.recv().await {
        render_event(&event);
        session.apply(generation, event);
    }

    if let Err(err) = pump.await? {
        session.fail(generation, err.to_string());
    }

    report(&session)
}

fn render_event(event: &BacktestEvent) {
    if let BacktestEvent::Progress(update) = event {
        println!(
            "{}  {:>5.1}%  portfolio {:>12.2}",
            update.date,
            update.progress * 100.0,
            update.portfolio_value
        );
    }
}

fn report(session: &RunSession) -> Result<()> {
    match session.phase() {
        RunPhase::Completed(summary) => {
            println!();
            println!("backtest complete: {}", summary.strategy_name);
            println!("  period          {} to {}", summary.start_date, summary.end_date);
            println!("  initial capital {:.2}", summary.initial_capital);
            println!("  final value     {:.2}", summary.final_value);
            println!("  total return    {:.2}%", summary.total_return * 100.0);
            println!("  sharpe ratio    {}", ratio(summary.sharpe_ratio));
            println!("  sortino ratio   {}", ratio(summary.sortino_ratio));
            println!("  max drawdown    {:.2}%", summary.max_drawdown * 100.0);
            println!("  win rate        {:.2}%", summary.win_rate * 100.0);
            println!("  trades          {}", summary.num_trades);
            Ok(())
        }
        RunPhase::Failed(message) => {
            if !session.equity().is_empty() {
                println!(
                    "(partial equity series: {} points before failure)",
                    session.equity().len()
                );
            }
            bail!("backtest failed: {message}");
        }
        // The pump either forwards a terminal event or returns an error
        phase => bail!("backtest ended in unexpected state: {phase:?}"),
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}
