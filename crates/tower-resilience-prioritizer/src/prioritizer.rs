//! Calibrates a `0..=499` rejection threshold from a set of registered
//! throttlers' stats.

use crate::config::PrioritizerConfig;
use crate::events::PrioritizerEvent;
use crate::fairness::FairnessTracker;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tdigests::TDigest;
use tower_resilience_core::{LimiterStats, RejectionThreshold};

/// Combines the rejection rates of every registered [`LimiterStats`] source
/// into a single rejection threshold that [`RejectionThreshold`] consumers
/// (in practice `tower_resilience_adaptive::PriorityThrottle`) check each
/// request's level against.
///
/// The threshold is recalibrated either by calling [`Prioritizer::calibrate`]
/// directly or by keeping the handle returned from
/// [`Prioritizer::schedule_calibrations`] alive.
pub struct Prioritizer {
    config: PrioritizerConfig,
    rejection_threshold: AtomicU32,
    // Tracks the levels of requests actually admitted, normalized into
    // [0, 1) so its quantiles compose with the [0, 1] rejection rate.
    digest: Mutex<TDigest>,
    limiters: Mutex<Vec<Arc<dyn LimiterStats>>>,
    fairness: Option<Arc<FairnessTracker>>,
}

impl Prioritizer {
    pub(crate) fn from_config(config: PrioritizerConfig, fairness: Option<Arc<FairnessTracker>>) -> Arc<Self> {
        let digest = TDigest::new_with_size(config.compression);
        Arc::new(Self {
            config,
            rejection_threshold: AtomicU32::new(0),
            digest: Mutex::new(digest),
            limiters: Mutex::new(Vec::new()),
            fairness,
        })
    }

    /// Registers a stats source this prioritizer should fold into its
    /// combined rejection rate on every calibration.
    pub fn register(&self, limiter: Arc<dyn LimiterStats>) {
        self.limiters.lock().unwrap().push(limiter);
    }

    /// Records a level that was actually admitted, feeding the t-digest used
    /// to map a combined rejection rate onto the level space.
    pub fn record_admitted_level(&self, level: u32) {
        let normalized = level as f64 / 500.0;
        let mut digest = self.digest.lock().unwrap();
        let current = std::mem::replace(&mut *digest, TDigest::new_with_size(self.config.compression));
        *digest = current.merge_unsorted(vec![normalized]);
    }

    /// Returns the registered fairness tracker, if one was configured.
    pub fn fairness(&self) -> Option<Arc<FairnessTracker>> {
        self.fairness.clone()
    }

    /// Combines registered limiters' stats and recomputes the rejection
    /// threshold. Returns `true` if the threshold changed, firing
    /// `on_event` listeners in that case.
    ///
    /// `CombineStats`: the rejection rate is the per-limiter rate weighted
    /// by each limiter's execution count; the ceiling is the smallest
    /// `max_rejection_rate` across all registered limiters.
    pub fn calibrate(&self) -> bool {
        let (combined_rate, max_rate) = {
            let limiters = self.limiters.lock().unwrap();
            if limiters.is_empty() {
                return false;
            }

            let mut weighted_rate_sum = 0.0;
            let mut weight_sum = 0.0;
            let mut max_rate = f64::INFINITY;
            for limiter in limiters.iter() {
                let executions = limiter.execution_count() as f64;
                weighted_rate_sum += limiter.rejection_rate() * executions;
                weight_sum += executions;
                max_rate = max_rate.min(limiter.max_rejection_rate());
            }

            let combined_rate = if weight_sum > 0.0 {
                weighted_rate_sum / weight_sum
            } else {
                0.0
            };
            (combined_rate, max_rate)
        };

        let clamped_rate = combined_rate.min(max_rate).max(0.0);

        let new_threshold = if clamped_rate <= 0.0 {
            0
        } else {
            let quantile = self.digest.lock().unwrap().estimate_quantile(clamped_rate);
            (quantile * 500.0).round().clamp(0.0, 499.0) as u32
        };

        let old_threshold = self.rejection_threshold.swap(new_threshold, Ordering::SeqCst);
        let changed = old_threshold != new_threshold;

        if changed {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                old_threshold,
                new_threshold,
                "prioritizer rejection threshold recalibrated"
            );

            #[cfg(feature = "metrics")]
            metrics::gauge!("prioritizer_rejection_threshold").set(new_threshold as f64);

            self.config.listeners.emit(&PrioritizerEvent::ThresholdChanged {
                name: self.config.name.clone(),
                old_threshold,
                new_threshold,
                timestamp: std::time::Instant::now(),
            });
        }

        changed
    }

    /// Spawns a background task that calls [`Prioritizer::calibrate`] on
    /// `calibration_interval`. Dropping the returned handle does not stop
    /// the task; abort it explicitly if calibration should end with the
    /// handle's scope.
    pub fn schedule_calibrations(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        let interval_duration = self.config.calibration_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                this.calibrate();
            }
        })
    }
}

impl RejectionThreshold for Prioritizer {
    fn rejection_threshold(&self) -> u32 {
        self.rejection_threshold.load(Ordering::SeqCst)
    }
}
