//! Events emitted by the adaptive throttler.

use std::time::Instant;
use tower_resilience_core::ResilienceEvent;

/// Events emitted during throttler execution.
#[derive(Debug, Clone)]
pub enum AdaptiveEvent {
    /// A permit was granted.
    PermitGranted {
        /// Name of the throttler instance.
        name: Option<String>,
        /// `throttleProbability` at the time the permit was granted.
        throttle_probability: f64,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// A permit was rejected.
    PermitRejected {
        /// Name of the throttler instance.
        name: Option<String>,
        /// `throttleProbability` at the time the permit was rejected.
        throttle_probability: f64,
        /// When this event occurred.
        timestamp: Instant,
    },

    /// A priority-aware throttler rejected a request below the current
    /// rejection threshold.
    PriorityRejected {
        /// Name of the throttler instance.
        name: Option<String>,
        /// The level assigned to the rejected request.
        level: u32,
        /// The threshold it failed to clear.
        threshold: u32,
        /// When this event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for AdaptiveEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdaptiveEvent::PermitGranted { .. } => "permit_granted",
            AdaptiveEvent::PermitRejected { .. } => "permit_rejected",
            AdaptiveEvent::PriorityRejected { .. } => "priority_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AdaptiveEvent::PermitGranted { timestamp, .. } => *timestamp,
            AdaptiveEvent::PermitRejected { timestamp, .. } => *timestamp,
            AdaptiveEvent::PriorityRejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            AdaptiveEvent::PermitGranted { name, .. } => name.as_deref().unwrap_or("adaptive"),
            AdaptiveEvent::PermitRejected { name, .. } => name.as_deref().unwrap_or("adaptive"),
            AdaptiveEvent::PriorityRejected { name, .. } => name.as_deref().unwrap_or("adaptive"),
        }
    }
}
