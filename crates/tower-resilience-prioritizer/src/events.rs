//! Events emitted by the prioritizer.

use std::time::Instant;
use tower_resilience_core::ResilienceEvent;

/// Events emitted during calibration.
#[derive(Debug, Clone)]
pub enum PrioritizerEvent {
    /// The rejection threshold changed as a result of calibration.
    ThresholdChanged {
        /// Name of the prioritizer instance.
        name: Option<String>,
        /// The threshold before this calibration.
        old_threshold: u32,
        /// The threshold after this calibration.
        new_threshold: u32,
        /// When this event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for PrioritizerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PrioritizerEvent::ThresholdChanged { .. } => "threshold_changed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PrioritizerEvent::ThresholdChanged { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            PrioritizerEvent::ThresholdChanged { name, .. } => {
                name.as_deref().unwrap_or("prioritizer")
            }
        }
    }
}
