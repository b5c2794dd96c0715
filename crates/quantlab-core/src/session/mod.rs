//! Run session state machine
//!
//! Replaces flag-based run tracking with an explicit phase enum so that a
//! result and an error can never be stored at the same time. Every mutation
//! is guarded by a generation token: events from a superseded run are
//! ignored rather than allowed to corrupt the active session.

use chrono::NaiveDate;
use tracing::warn;

use crate::api::types::BacktestSummary;
use crate::stream::BacktestEvent;

/// One (date, portfolio value) point of the equity series
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Observable run state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed(Box<BacktestSummary>),
    Failed(String),
}

/// Aggregate state for one in-flight or finished backtest run.
///
/// Exactly one session is active per dashboard instance; starting a new run
/// discards the previous run's data before any of its events arrive.
#[derive(Debug, Default)]
pub struct RunSession {
    phase: RunPhase,
    /// Completed fraction in [0, 1]; percentage scaling is a presentation
    /// concern, not stored here
    progress: f64,
    equity: Vec<EquityPoint>,
    generation: u64,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run: clear accumulated state, enter `Running`, and
    /// return the generation token that events for this run must carry.
    pub fn begin_run(&mut self) -> u64 {
        self.generation += 1;
        self.equity.clear();
        self.progress = 0.0;
        self.phase = RunPhase::Running;
        self.generation
    }

    /// Apply one dispatched event.
    ///
    /// Events carrying a stale generation, or arriving outside `Running`,
    /// are protocol violations: logged and ignored, stored state untouched.
    pub fn apply(&mut self, generation: u64, event: BacktestEvent) {
        if generation != self.generation {
            warn!(
                "ignoring event from superseded run (generation {generation}, active {})",
                self.generation
            );
            return;
        }
        if self.phase != RunPhase::Running {
            warn!("ignoring event outside a running session: {event:?}");
            return;
        }
        match event {
            BacktestEvent::Progress(update) => {
                self.equity.push(EquityPoint {
                    date: update.date,
                    value: update.portfolio_value,
                });
                self.progress = update.progress;
            }
            BacktestEvent::Complete(summary) => {
                self.progress = 1.0;
                self.phase = RunPhase::Completed(summary);
            }
            BacktestEvent::Error(message) => {
                self.phase = RunPhase::Failed(message);
            }
        }
    }

    /// Record a transport-level failure for the given run.
    ///
    /// The partial equity series is kept so it stays visible alongside the
    /// failure message.
    pub fn fail(&mut self, generation: u64, message: impl Into<String>) {
        if generation != self.generation {
            warn!("ignoring failure from superseded run");
            return;
        }
        if self.phase != RunPhase::Running {
            return;
        }
        self.phase = RunPhase::Failed(message.into());
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn equity(&self) -> &[EquityPoint] {
        &self.equity
    }
}
