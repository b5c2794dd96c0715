//! QuantLab dashboard CLI
//!
//! Configure and monitor backtests running on the remote quant_lab service.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quantlab", version, about = "Configure and monitor QuantLab backtests")]
struct Cli {
    /// Backtest service URL (overrides QUANTLAB_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available strategies
    Strategies,
    /// Run a backtest and stream its progress
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with progress output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(cli.api_url)?;

    match cli.command {
        Command::Strategies => commands::strategies::list(&config).await,
        Command::Run(args) => commands::run::execute(&config, args).await,
    }
}
