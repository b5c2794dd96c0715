//! Backtest service API
//!
//! HTTP client and wire types for the quant_lab backtest service.

pub mod client;
pub mod error;
pub mod types;

pub use client::BacktestClient;
pub use error::StreamError;
