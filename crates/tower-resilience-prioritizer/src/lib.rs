//! Rejection-threshold calibrator for priority-aware throttlers.
//!
//! A [`Prioritizer`] polls a set of registered `LimiterStats` sources (in
//! practice `tower_resilience_adaptive::Throttle` handles reached through
//! `PriorityThrottleLayer::throttle`), combines their rejection rates into a
//! single target rate, and maps that rate through a t-digest of previously
//! admitted levels to produce a `rejection_threshold` in `0..=499` — the
//! same level space `tower_resilience_core::PriorityLevel::level_range`
//! carves up. `tower_resilience_adaptive::PriorityThrottleLayer` reads this
//! threshold on every request through the `RejectionThreshold` trait.
//!
//! An optional [`FairnessTracker`] ranks individual users by a usage EWMA so
//! heavier users' requests degrade to lower levels — and so drop first —
//! under the same nominal priority.
//!
//! # Example
//!
//! ```rust
//! use tower_resilience_prioritizer::PrioritizerConfigBuilder;
//! use tower_resilience_core::RejectionThreshold;
//!
//! let prioritizer = PrioritizerConfigBuilder::new()
//!     .calibration_interval(std::time::Duration::from_secs(5))
//!     .build();
//!
//! // A priority throttle registers itself as a stats source, then the
//! // prioritizer is recalibrated periodically (or on demand via `calibrate`).
//! assert_eq!(prioritizer.rejection_threshold(), 0);
//! ```

mod config;
mod events;
mod fairness;
mod prioritizer;

pub use config::PrioritizerConfigBuilder;
pub use events::PrioritizerEvent;
pub use fairness::FairnessTracker;
pub use prioritizer::Prioritizer;
