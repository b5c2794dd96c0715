//! Error types for the backtest service client
//!
//! Only transport-level failures surface here; malformed frames and
//! protocol violations are recovered inside the stream pipeline and never
//! cross this boundary.

use std::time::Duration;

/// Failure of the initiating request or the live stream
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Request could not be sent or the connection broke mid-stream
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("backtest service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// No chunk arrived within the idle-read timeout
    #[error("stream idle for {0:?} without data")]
    IdleTimeout(Duration),

    /// Stream closed before a terminal complete/error event
    #[error("stream closed before the run finished")]
    Disconnected,

    /// Run was superseded by a newer one
    #[error("run cancelled")]
    Cancelled,
}
