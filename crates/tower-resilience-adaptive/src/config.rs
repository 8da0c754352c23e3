//! Configuration for the adaptive throttler.

use crate::events::AdaptiveEvent;
use std::time::Duration;
use tower_resilience_core::EventListeners;

/// Configuration shared by the plain and priority-aware throttlers.
pub struct ThrottleConfig {
    pub(crate) name: Option<String>,
    pub(crate) success_rate_threshold: f64,
    pub(crate) request_padding: u64,
    pub(crate) max_rejection_probability: f64,
    pub(crate) thresholding_period: Duration,
    pub(crate) bucket_count: usize,
    pub(crate) listeners: EventListeners<AdaptiveEvent>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            name: None,
            success_rate_threshold: 0.9,
            request_padding: 1,
            max_rejection_probability: 0.9,
            thresholding_period: Duration::from_secs(60),
            bucket_count: 20,
            listeners: EventListeners::default(),
        }
    }
}

/// Builder for [`ThrottleConfig`].
pub struct ThrottleConfigBuilder {
    config: ThrottleConfig,
}

impl Default for ThrottleConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrottleConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ThrottleConfig::default(),
        }
    }

    /// Give this throttler a human-readable name for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Expected success rate of admitted traffic; `1 - success_rate_threshold`
    /// is the overhead the throttler tolerates admitting beyond what the
    /// dependency is currently succeeding at.
    ///
    /// Default: 0.9
    pub fn success_rate_threshold(mut self, threshold: f64) -> Self {
        self.config.success_rate_threshold = threshold;
        self
    }

    /// Added to the denominator of the rejection-probability formula to
    /// avoid divide-by-zero and bias toward admission at low volumes.
    ///
    /// Default: 1
    pub fn request_padding(mut self, padding: u64) -> Self {
        self.config.request_padding = padding;
        self
    }

    /// Caps how much traffic can ever be shed, so some requests keep
    /// reaching the dependency for probing even under sustained pressure.
    ///
    /// Default: 0.9
    pub fn max_rejection_probability(mut self, max: f64) -> Self {
        self.config.max_rejection_probability = max;
        self
    }

    /// Sets the rolling window over which request/accept counts are
    /// tracked, and the number of buckets it's divided into.
    ///
    /// Default: 1 minute, 20 buckets
    pub fn thresholding_period(mut self, period: Duration, bucket_count: usize) -> Self {
        self.config.thresholding_period = period;
        self.config.bucket_count = bucket_count;
        self
    }

    /// Register a callback for throttler events.
    pub fn on_event<L>(mut self, listener: L) -> Self
    where
        L: tower_resilience_core::EventListener<AdaptiveEvent> + 'static,
    {
        self.config.listeners.add(listener);
        self
    }

    pub(crate) fn build_config(self) -> ThrottleConfig {
        self.config
    }
}
