use crate::config::CircuitBreakerConfig;
use crate::CircuitBreaker;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies circuit breaker behavior to an inner service.
///
/// # Example
///
/// ```rust
/// use tower::{ServiceBuilder, service_fn};
/// use tower_resilience_circuitbreaker::CircuitBreakerLayer;
///
/// let layer = CircuitBreakerLayer::<String, std::io::Error>::builder()
///     .count_based(100, 50)
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
pub struct CircuitBreakerLayer<Res, Err> {
    config: Arc<CircuitBreakerConfig<Res, Err>>,
}

impl<Res, Err> CircuitBreakerLayer<Res, Err> {
    /// Creates a new `CircuitBreakerLayer` from the given configuration.
    pub(crate) fn new(config: impl Into<Arc<CircuitBreakerConfig<Res, Err>>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Creates a new builder for configuring a circuit breaker layer.
    pub fn builder() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        crate::CircuitBreakerConfigBuilder::new()
    }

    // =========================================================================
    // Presets
    // =========================================================================

    /// Preset: Standard balanced circuit breaker configuration.
    ///
    /// 50% failure rate over the last 100 calls, 30 second wait duration in
    /// open state, 3 permitted calls in half-open state.
    pub fn standard() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .count_based(100, 50)
            .wait_duration_in_open(Duration::from_secs(30))
            .permitted_calls_in_half_open(3)
    }

    /// Preset: Fast-fail circuit breaker for latency-sensitive scenarios.
    ///
    /// 25% failure rate over the last 20 calls, 10 second wait duration in
    /// open state, 1 permitted call in half-open state.
    pub fn fast_fail() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .count_based(20, 5)
            .wait_duration_in_open(Duration::from_secs(10))
            .permitted_calls_in_half_open(1)
    }

    /// Preset: Tolerant circuit breaker that opens only after sustained failure.
    ///
    /// 75% failure rate over the last 200 calls, 60 second wait duration in
    /// open state, 5 permitted calls in half-open state.
    pub fn tolerant() -> crate::CircuitBreakerConfigBuilder<Res, Err> {
        use std::time::Duration;
        Self::builder()
            .count_based(200, 150)
            .wait_duration_in_open(Duration::from_secs(60))
            .permitted_calls_in_half_open(5)
    }
}

impl<Res, Err> Clone for CircuitBreakerLayer<Res, Err> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, Res, Err> Layer<S> for CircuitBreakerLayer<Res, Err> {
    type Service = CircuitBreaker<S, Req, Res, Err>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, Arc::clone(&self.config))
    }
}
