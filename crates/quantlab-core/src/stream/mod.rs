//! Event stream processing
//!
//! Converts the raw chunked response body from the backtest service into
//! typed events: the decoder reassembles complete frames across arbitrary
//! chunk boundaries, the classifier turns each frame into a `BacktestEvent`.

pub mod decoder;
pub mod event;

pub use decoder::FrameDecoder;
pub use event::BacktestEvent;
