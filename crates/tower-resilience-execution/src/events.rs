//! Top-level completion events fired by the `Executor`.

use std::time::{Duration, Instant};
use tower_resilience_core::events::ResilienceEvent;

/// Fired once per call: always `on_complete`, and exactly one of
/// `on_success`/`on_failure` depending on `success_all`.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    Complete {
        pattern_name: String,
        timestamp: Instant,
        attempts: u32,
        elapsed: Duration,
        success: bool,
    },
    Success {
        pattern_name: String,
        timestamp: Instant,
        attempts: u32,
        elapsed: Duration,
    },
    Failure {
        pattern_name: String,
        timestamp: Instant,
        attempts: u32,
        elapsed: Duration,
    },
}

impl ResilienceEvent for ExecutionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutionEvent::Complete { .. } => "Complete",
            ExecutionEvent::Success { .. } => "Success",
            ExecutionEvent::Failure { .. } => "Failure",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutionEvent::Complete { timestamp, .. }
            | ExecutionEvent::Success { timestamp, .. }
            | ExecutionEvent::Failure { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ExecutionEvent::Complete { pattern_name, .. }
            | ExecutionEvent::Success { pattern_name, .. }
            | ExecutionEvent::Failure { pattern_name, .. } => pattern_name,
        }
    }
}
