//! Tower Layer implementation for the plain adaptive throttler.

use crate::config::{ThrottleConfig, ThrottleConfigBuilder};
use crate::service::AdaptiveThrottle;
use crate::throttle::Throttle;
use std::sync::Arc;
use tower_layer::Layer;

/// A Tower [`Layer`] that probabilistically sheds load based on recent
/// execution/success counts.
///
/// See the [crate-level documentation](crate) for more details.
pub struct AdaptiveThrottleLayer {
    throttle: Arc<Throttle>,
}

impl AdaptiveThrottleLayer {
    /// Creates a builder for configuring the throttler.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_adaptive::AdaptiveThrottleLayer;
    ///
    /// let layer = AdaptiveThrottleLayer::builder()
    ///     .success_rate_threshold(0.9)
    ///     .build();
    /// ```
    pub fn builder() -> ThrottleConfigBuilder {
        ThrottleConfigBuilder::new()
    }

    pub(crate) fn from_config(config: ThrottleConfig) -> Self {
        Self {
            throttle: Arc::new(Throttle::new(config)),
        }
    }

    /// Returns a handle to the underlying throttle, for inspecting
    /// `throttle_probability()` outside the request path.
    pub fn throttle(&self) -> Arc<Throttle> {
        Arc::clone(&self.throttle)
    }
}

impl Clone for AdaptiveThrottleLayer {
    fn clone(&self) -> Self {
        Self {
            throttle: Arc::clone(&self.throttle),
        }
    }
}

impl<S> Layer<S> for AdaptiveThrottleLayer {
    type Service = AdaptiveThrottle<S>;

    fn layer(&self, service: S) -> Self::Service {
        AdaptiveThrottle::new(service, Arc::clone(&self.throttle))
    }
}

impl ThrottleConfigBuilder {
    /// Builds the [`AdaptiveThrottleLayer`].
    pub fn build(self) -> AdaptiveThrottleLayer {
        AdaptiveThrottleLayer::from_config(self.build_config())
    }
}
