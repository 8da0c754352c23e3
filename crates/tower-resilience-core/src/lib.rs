//! Core infrastructure for tower-resilience.
//!
//! This crate provides shared functionality used across all tower-resilience modules:
//! - Event system for observability
//! - Unified error type for composed policy stacks
//! - The AIMD atomic-state controller backing retry budgets
//! - The `RejectionThreshold`/`PriorityLevel` types shared by the adaptive
//!   throttler and the prioritizer that calibrates it

pub mod aimd;
pub mod error;
pub mod events;
pub mod priority;

pub use aimd::{AimdConfig, AimdController};
pub use error::ResilienceError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use priority::{LimiterStats, PriorityLevel, RejectionThreshold};
