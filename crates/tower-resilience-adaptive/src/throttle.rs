//! Probabilistic admission engine shared by the plain and priority-aware
//! throttlers.

use crate::config::ThrottleConfig;
use crate::events::AdaptiveEvent;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower_resilience_core::LimiterStats;
use tower_resilience_windows::{Clock, SystemClock, TimeBucketedStats};

/// Tracks recent execution/acceptance counts and derives a rejection
/// probability from them.
///
/// `AcquirePermit` and the `record_*` hooks share the same mutex, so a read
/// of [`Throttle::throttle_probability`] always reflects the value last
/// computed under the lock.
pub struct Throttle {
    stats: Mutex<TimeBucketedStats>,
    clock: Arc<dyn Clock>,
    config: ThrottleConfig,
    last_probability_bits: AtomicU64,
}

impl Throttle {
    pub(crate) fn new(config: ThrottleConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub(crate) fn with_clock(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            stats: Mutex::new(TimeBucketedStats::new(
                config.bucket_count,
                config.thresholding_period,
                now,
            )),
            clock,
            config,
            last_probability_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    pub(crate) fn emit(&self, event: &AdaptiveEvent) {
        self.config.listeners.emit(event);
    }

    /// `rejectProbability = max(0, requests - accepts/successRateThreshold) /
    /// (requests + requestPadding)`, clamped by `maxRejectionProbability`.
    fn recompute(&self, stats: &mut TimeBucketedStats) -> f64 {
        let requests = stats.execution_count(self.clock.as_ref()) as f64;
        let accepts = stats.success_count(self.clock.as_ref()) as f64;
        let raw = (requests - accepts / self.config.success_rate_threshold).max(0.0)
            / (requests + self.config.request_padding as f64);
        let clamped = raw.min(self.config.max_rejection_probability);
        self.last_probability_bits
            .store(clamped.to_bits(), Ordering::Relaxed);
        clamped
    }

    /// Draws a uniform `u` in `[0, 1)` and admits iff `throttleProbability <=
    /// u`. Rejections record a failure against the same window.
    pub(crate) fn try_acquire(&self) -> (bool, f64) {
        let mut stats = self.stats.lock().unwrap();
        let probability = self.recompute(&mut stats);
        let u: f64 = rand::rng().random_range(0.0..1.0);
        let admitted = probability <= u;
        if !admitted {
            stats.record_failure(self.clock.as_ref());
            self.recompute(&mut stats);
        }
        (admitted, probability)
    }

    pub(crate) fn record_success(&self) {
        let mut stats = self.stats.lock().unwrap();
        stats.record_success(self.clock.as_ref());
        self.recompute(&mut stats);
    }

    pub(crate) fn record_failure(&self) {
        let mut stats = self.stats.lock().unwrap();
        stats.record_failure(self.clock.as_ref());
        self.recompute(&mut stats);
    }

    /// The `throttleProbability` last computed under the stats lock.
    pub fn throttle_probability(&self) -> f64 {
        f64::from_bits(self.last_probability_bits.load(Ordering::Relaxed))
    }

    /// Resets the rolling window, discarding all recorded executions.
    pub fn reset(&self) {
        let mut stats = self.stats.lock().unwrap();
        stats.reset(self.clock.as_ref());
        self.recompute(&mut stats);
    }
}

impl LimiterStats for Throttle {
    fn rejection_rate(&self) -> f64 {
        self.throttle_probability()
    }

    fn execution_count(&self) -> u64 {
        let mut stats = self.stats.lock().unwrap();
        stats.execution_count(self.clock.as_ref())
    }

    fn max_rejection_rate(&self) -> f64 {
        self.config.max_rejection_probability
    }
}
