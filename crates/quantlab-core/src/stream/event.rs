//! Frame classification
//!
//! Turns a complete frame into a typed [`BacktestEvent`]. Classification is
//! deliberately lenient: a frame missing its `event:` or `data:` line, or
//! carrying an undecodable payload, is dropped with a diagnostic and must
//! never halt the stream.

use tracing::warn;

use crate::api::types::{BacktestSummary, ProgressUpdate};

/// A classified event from the backtest stream
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestEvent {
    /// Periodic progress update while the run simulates
    Progress(ProgressUpdate),
    /// Terminal success: the final results record
    Complete(Box<BacktestSummary>),
    /// Terminal failure: a human-readable message, passed through verbatim
    Error(String),
}

impl BacktestEvent {
    /// Parse one complete frame into an event.
    ///
    /// Returns `None` for frames that cannot be classified; the caller is
    /// expected to continue with the next frame.
    pub fn parse(frame: &str) -> Option<Self> {
        let mut event_type: Option<&str> = None;
        let mut data: Option<&str> = None;

        for line in frame.lines() {
            // SSE comment lines
            if line.starts_with(':') {
                continue;
            }
            if let Some(value) = line.strip_prefix("event:") {
                event_type.get_or_insert(value.trim());
            } else if let Some(value) = line.strip_prefix("data:") {
                // Exactly one leading space is part of the field syntax,
                // everything after it is payload
                data.get_or_insert(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        let (Some(event_type), Some(data)) = (event_type, data) else {
            warn!("dropping frame without event/data lines: {:?}", frame);
            return None;
        };

        match event_type {
            "progress" => match serde_json::from_str::<ProgressUpdate>(data) {
                Ok(update) => Some(Self::Progress(update)),
                Err(err) => {
                    warn!("dropping progress frame with bad payload: {err}");
                    None
                }
            },
            "complete" => match serde_json::from_str::<BacktestSummary>(data) {
                Ok(summary) => Some(Self::Complete(Box::new(summary))),
                Err(err) => {
                    warn!("dropping complete frame with bad payload: {err}");
                    None
                }
            },
            // Error payloads are plain text, not JSON
            "error" => Some(Self::Error(data.to_string())),
            other => {
                warn!("dropping frame with unknown event type {other:?}");
                None
            }
        }
    }

    /// Whether this event ends the run (no further events are valid after it)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }
}
