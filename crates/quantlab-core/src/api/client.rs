//! HTTP client for the backtest service
//!
//! `list_strategies` is an ordinary JSON call; `run_backtest` opens the
//! long-lived streaming response and pumps decoded events to the caller's
//! channel, in order, until a terminal event or a transport failure.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::StreamError;
use super::types::{BacktestRequest, StrategyInfo};
use crate::stream::{BacktestEvent, FrameDecoder};

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the backtest service
#[derive(Debug, Clone)]
pub struct BacktestClient {
    http: reqwest::Client,
    base_url: String,
    idle_timeout: Duration,
}

impl BacktestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Override the idle-read timeout applied while waiting for chunks
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Fetch the list of available strategies
    pub async fn list_strategies(&self) -> Result<Vec<StrategyInfo>, StreamError> {
        let url = format!("{}/api/strategies", self.base_url);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Start a backtest and stream its events to `events`.
    ///
    /// Events are sent exactly once each, in frame order, synchronously with
    /// decoding. Returns once a terminal event has been forwarded; a stream
    /// that ends without one is a transport failure. Cancelling `cancel`
    /// stops the pump without delivering further events, so a superseded
    /// run can never reach the new session.
    pub async fn run_backtest(
        &self,
        request: &BacktestRequest,
        events: mpsc::UnboundedSender<BacktestEvent>,
        cancel: CancellationToken,
    ) -> Result<(), StreamError> {
        let url = format!("{}/api/backtest/run", self.base_url);
        debug!(
            "starting backtest: strategy={} tickers={:?}",
            request.strategy_id, request.tickers
        );
        let response = self.http.post(&url).json(request).send().await?;
        let response = check_status(response).await?;

        let chunks = response.bytes_stream().map(|r| r.map_err(StreamError::from));
        pump_events(chunks, events, self.idle_timeout, cancel).await
    }
}

/// Surface non-success responses as errors, capturing the body text
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StreamError::Status { status, body })
}

/// Decode, classify, and dispatch one stream's chunks.
///
/// Split out from the HTTP layer so it can be driven by an in-memory chunk
/// stream in tests.
async fn pump_events<S>(
    chunks: S,
    events: mpsc::UnboundedSender<BacktestEvent>,
    idle_timeout: Duration,
    cancel: CancellationToken,
) -> Result<(), StreamError>
where
    S: Stream<Item = Result<Bytes, StreamError>>,
{
    tokio::pin!(chunks);
    let mut decoder = FrameDecoder::new();

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            next = timeout(idle_timeout, chunks.next()) => {
                next.map_err(|_| StreamError::IdleTimeout(idle_timeout))?
            }
        };
        let Some(chunk) = next else { break };
        let chunk = chunk?;

        for frame in decoder.push(&chunk) {
            let Some(event) = BacktestEvent::parse(&frame) else {
                continue;
            };
            let terminal = event.is_terminal();
            if events.send(event).is_err() {
                // Receiver dropped: the run was abandoned
                debug!("event receiver gone, stopping stream pump");
                return Ok(());
            }
            if terminal {
                return Ok(());
            }
        }
    }

    if let Some(tail) = decoder.finish() {
        warn!(
            "stream closed with {} bytes of undelimited frame data",
            tail.len()
        );
    }
    Err(StreamError::Disconnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const IDLE: Duration = Duration::from_secs(5);

    fn chunks_of(parts: &[&str]) -> Vec<Result<Bytes, StreamError>> {
        parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect()
    }

    async fn run_pump(
        parts: &[&str],
    ) -> (Result<(), StreamError>, Vec<BacktestEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = pump_events(
            stream::iter(chunks_of(parts)),
            tx,
            IDLE,
            CancellationToken::new(),
        )
        .await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (result, events)
    }

    #[tokio::test]
    async fn test_events_dispatched_in_order_across_chunk_splits() {
        // Frame boundaries intentionally misaligned with chunk boundaries
        let (result, events) = run_pump(&[
            "event: progress\ndata: {\"date\":\"2024-01-02\",\"prog",
            "ress\":0.5,\"portfolio_value\":105000}\n\nevent: error\nda",
            "ta: insufficient data\n\n",
        ])
        .await;

        result.unwrap();
        assert_eq!(events.len(), 2);
        let BacktestEvent::Progress(update) = &events[0] else {
            panic!("expected progress first, got {:?}", events[0]);
        };
        assert_eq!(update.portfolio_value, 105000.0);
        assert_eq!(events[1], BacktestEvent::Error("insufficient data".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_frame_dropped_stream_continues() {
        let (result, events) = run_pump(&[
            "event: progress\ndata: {not json}\n\n",
            "event: error\ndata: boom\n\n",
        ])
        .await;

        result.unwrap();
        assert_eq!(events, vec![BacktestEvent::Error("boom".to_string())]);
    }

    #[tokio::test]
    async fn test_pump_stops_after_terminal_event() {
        let (result, events) = run_pump(&[
            "event: error\ndata: boom\n\n\
             event: progress\ndata: {\"date\":\"2024-01-02\",\"progress\":0.9,\"portfolio_value\":1.0}\n\n",
        ])
        .await;

        result.unwrap();
        assert_eq!(events, vec![BacktestEvent::Error("boom".to_string())]);
    }

    #[tokio::test]
    async fn test_stream_ending_without_terminal_event_is_a_failure() {
        let (result, events) = run_pump(&[
            "event: progress\ndata: {\"date\":\"2024-01-02\",\"progress\":0.5,\"portfolio_value\":1.0}\n\n",
            "event: progress\ndata: {\"date\":\"2024-01-03\",\"pr",
        ])
        .await;

        assert!(matches!(result, Err(StreamError::Disconnected)));
        // The partial trailing frame is never emitted
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_pump_without_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pump_events(stream::pending(), tx, IDLE, cancel).await;

        assert!(matches!(result, Err(StreamError::Cancelled)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_idle_timeout_surfaces_as_transport_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = pump_events(
            stream::pending(),
            tx,
            Duration::from_millis(10),
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(StreamError::IdleTimeout(_))));
    }

    #[tokio::test]
    async fn test_mid_stream_transport_error_propagates_after_prior_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let items: Vec<Result<Bytes, StreamError>> = vec![
            Ok(Bytes::from_static(b"event: progress\ndata: {\"date\":\"2024-01-02\",\"progress\":0.5,\"portfolio_value\":1.0}\n\n")),
            Err(StreamError::Disconnected),
        ];
        let result = pump_events(
            stream::iter(items),
            tx,
            IDLE,
            CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert!(matches!(rx.try_recv(), Ok(BacktestEvent::Progress(_))));
    }
}
