//! Adaptive throttler for Tower services.
//!
//! Unlike a circuit breaker's binary open/closed decision, the adaptive
//! throttler sheds load probabilistically: it tracks recent execution and
//! success counts over a rolling window and computes a `throttleProbability`
//! that rises smoothly as the downstream service's actual success rate
//! falls below what's expected, while always leaving a sliver of traffic
//! admitted so the dependency's recovery can be observed.
//!
//! A priority-aware variant defers the admission decision to a calibrated
//! rejection threshold instead — see [`PriorityThrottleLayer`] and the
//! `tower-resilience-core::RejectionThreshold`/`LimiterStats` traits it and
//! a prioritizer interoperate through.
//!
//! # Example
//!
//! ```rust
//! use tower_resilience_adaptive::AdaptiveThrottleLayer;
//! use tower::{Service, ServiceBuilder, ServiceExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = tower::service_fn(|req: String| async move {
//!     Ok::<_, std::convert::Infallible>(format!("Hello, {}!", req))
//! });
//!
//! let mut service = ServiceBuilder::new()
//!     .layer(AdaptiveThrottleLayer::builder()
//!         .success_rate_threshold(0.9)
//!         .build())
//!     .service(service);
//!
//! let response = service.ready().await?.call("World".to_string()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Priority-aware throttling
//!
//! ```rust,no_run
//! use tower_resilience_adaptive::AdaptiveThrottleLayer;
//! use tower_resilience_core::RejectionThreshold;
//! use std::sync::Arc;
//!
//! struct FixedThreshold;
//! impl RejectionThreshold for FixedThreshold {
//!     fn rejection_threshold(&self) -> u32 { 100 }
//! }
//!
//! let layer = AdaptiveThrottleLayer::builder()
//!     .build_with_level(Arc::new(FixedThreshold), |req: &u32| *req);
//! ```

mod config;
mod error;
mod events;
mod layer;
mod priority_throttle;
mod service;
mod throttle;

pub use config::ThrottleConfigBuilder;
pub use error::AdaptiveError;
pub use events::AdaptiveEvent;
pub use layer::AdaptiveThrottleLayer;
pub use priority_throttle::{PriorityThrottle, PriorityThrottleFuture, PriorityThrottleLayer};
pub use service::{AdaptiveFuture, AdaptiveThrottle};
pub use throttle::Throttle;
