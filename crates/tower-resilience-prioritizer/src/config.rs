//! Configuration for the prioritizer.

use crate::events::PrioritizerEvent;
use crate::fairness::FairnessTracker;
use crate::prioritizer::Prioritizer;
use std::sync::Arc;
use std::time::Duration;
use tower_resilience_core::EventListeners;

pub(crate) struct PrioritizerConfig {
    pub(crate) name: Option<String>,
    pub(crate) compression: usize,
    pub(crate) calibration_interval: Duration,
    pub(crate) listeners: EventListeners<PrioritizerEvent>,
}

impl Default for PrioritizerConfig {
    fn default() -> Self {
        Self {
            name: None,
            compression: 100,
            calibration_interval: Duration::from_secs(1),
            listeners: EventListeners::default(),
        }
    }
}

/// Builder for a [`Prioritizer`].
pub struct PrioritizerConfigBuilder {
    config: PrioritizerConfig,
    fairness_capacity: Option<usize>,
}

impl Default for PrioritizerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PrioritizerConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PrioritizerConfig::default(),
            fairness_capacity: None,
        }
    }

    /// Give this prioritizer a human-readable name for observability.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Compression factor of the t-digest tracking admitted levels. Higher
    /// values trade memory for quantile accuracy.
    ///
    /// Default: 100
    pub fn compression(mut self, compression: usize) -> Self {
        self.config.compression = compression;
        self
    }

    /// How often [`Prioritizer::schedule_calibrations`] recalibrates the
    /// rejection threshold.
    ///
    /// Default: 1 second
    pub fn calibration_interval(mut self, interval: Duration) -> Self {
        self.config.calibration_interval = interval;
        self
    }

    /// Register a callback for calibration events.
    pub fn on_event<L>(mut self, listener: L) -> Self
    where
        L: tower_resilience_core::EventListener<PrioritizerEvent> + 'static,
    {
        self.config.listeners.add(listener);
        self
    }

    /// Enables the optional per-user fairness tracker, bounding it to at
    /// most `capacity` recently-seen users.
    pub fn with_fairness(mut self, capacity: usize) -> Self {
        self.fairness_capacity = Some(capacity);
        self
    }

    /// Builds the [`Prioritizer`].
    pub fn build(self) -> Arc<Prioritizer> {
        let fairness = self.fairness_capacity.map(|cap| Arc::new(FairnessTracker::new(cap)));
        Prioritizer::from_config(self.config, fairness)
    }
}
