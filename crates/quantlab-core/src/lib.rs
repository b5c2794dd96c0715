//! Core library for QuantLab
//!
//! Client for the remote backtest service: wire types, streaming event
//! decoding, and per-run session state.

pub mod api;
pub mod session;
pub mod stream;
