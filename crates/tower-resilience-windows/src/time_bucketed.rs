//! Time-bucketed success/failure counters.
//!
//! A fixed number of fixed-duration buckets spanning a configured
//! thresholding period. Not thread-safe on its own; the owning policy holds
//! a mutex around it, the same way `Circuit` guards its own counters.

use crate::clock::Clock;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    successes: u64,
    failures: u64,
    start_time: Option<Instant>,
}

impl Bucket {
    fn clear_at(&mut self, start_time: Instant) {
        self.successes = 0;
        self.failures = 0;
        self.start_time = Some(start_time);
    }
}

/// Rolling success/failure counters bucketed over a window of time.
pub struct TimeBucketedStats {
    buckets: Vec<Bucket>,
    bucket_size: Duration,
    head: usize,
    total_successes: u64,
    total_failures: u64,
}

impl TimeBucketedStats {
    /// Creates a new instance with `bucket_count` buckets spanning
    /// `window_duration`, anchored at `now`.
    pub fn new(bucket_count: usize, window_duration: Duration, now: Instant) -> Self {
        assert!(bucket_count > 0, "bucket_count must be > 0");
        let bucket_size = window_duration / bucket_count as u32;
        let mut buckets = vec![Bucket::default(); bucket_count];
        buckets[0].clear_at(now);
        Self {
            buckets,
            bucket_size,
            head: 0,
            total_successes: 0,
            total_failures: 0,
        }
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Advances the head to `now`, zeroing any buckets that elapsed and
    /// decrementing the running summary by their contribution. If the
    /// elapsed time spans more buckets than exist, the whole window resets.
    fn advance(&mut self, now: Instant) {
        let current_start = self
            .buckets
            .get(self.head)
            .and_then(|b| b.start_time)
            .unwrap_or(now);
        if now < current_start {
            return;
        }
        let elapsed = now.saturating_duration_since(current_start);
        let steps = (elapsed.as_nanos() / self.bucket_size.as_nanos().max(1)) as usize;
        if steps == 0 {
            return;
        }
        if steps >= self.bucket_count() {
            self.reset_all(now);
            return;
        }
        for i in 1..=steps {
            let idx = (self.head + i) % self.bucket_count();
            let bucket = self.buckets[idx];
            self.total_successes = self.total_successes.saturating_sub(bucket.successes);
            self.total_failures = self.total_failures.saturating_sub(bucket.failures);
            let bucket_start = current_start + self.bucket_size * i as u32;
            self.buckets[idx].clear_at(bucket_start);
        }
        self.head = (self.head + steps) % self.bucket_count();
    }

    fn reset_all(&mut self, now: Instant) {
        for bucket in &mut self.buckets {
            *bucket = Bucket::default();
        }
        self.buckets[0].clear_at(now);
        self.head = 0;
        self.total_successes = 0;
        self.total_failures = 0;
    }

    pub fn record_success(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        self.advance(now);
        self.buckets[self.head].successes += 1;
        self.total_successes += 1;
    }

    pub fn record_failure(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        self.advance(now);
        self.buckets[self.head].failures += 1;
        self.total_failures += 1;
    }

    /// Total recorded executions currently inside the window.
    pub fn execution_count(&mut self, clock: &dyn Clock) -> u64 {
        self.advance(clock.now());
        self.total_successes + self.total_failures
    }

    pub fn success_count(&mut self, clock: &dyn Clock) -> u64 {
        self.advance(clock.now());
        self.total_successes
    }

    pub fn failure_count(&mut self, clock: &dyn Clock) -> u64 {
        self.advance(clock.now());
        self.total_failures
    }

    /// Failure rate rounded to an integer percent (0-100), 0 when no
    /// executions have been recorded.
    pub fn failure_rate_percent(&mut self, clock: &dyn Clock) -> u32 {
        let total = self.execution_count(clock);
        if total == 0 {
            return 0;
        }
        ((self.total_failures as f64 / total as f64) * 100.0).round() as u32
    }

    pub fn success_rate_percent(&mut self, clock: &dyn Clock) -> u32 {
        let total = self.execution_count(clock);
        if total == 0 {
            return 0;
        }
        ((self.total_successes as f64 / total as f64) * 100.0).round() as u32
    }

    pub fn reset(&mut self, clock: &dyn Clock) {
        self.reset_all(clock.now());
    }
}
