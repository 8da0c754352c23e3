//! The shared `Stats` abstraction: a count-based or time-based success/
//! failure counter behind one interface, so the circuit breaker and
//! throttler can be generic over which windowing strategy backs them.

use crate::clock::Clock;
use crate::counting::CountingStats;
use crate::time_bucketed::TimeBucketedStats;
use std::time::Duration;
use tokio::time::Instant;

pub enum Stats {
    Counting(CountingStats),
    TimeBucketed(TimeBucketedStats),
}

impl Stats {
    pub fn count_based(capacity: usize) -> Self {
        Stats::Counting(CountingStats::new(capacity))
    }

    pub fn time_based(bucket_count: usize, window_duration: Duration, now: Instant) -> Self {
        Stats::TimeBucketed(TimeBucketedStats::new(bucket_count, window_duration, now))
    }

    pub fn record_success(&mut self, clock: &dyn Clock) {
        match self {
            Stats::Counting(s) => s.record_success(),
            Stats::TimeBucketed(s) => s.record_success(clock),
        }
    }

    pub fn record_failure(&mut self, clock: &dyn Clock) {
        match self {
            Stats::Counting(s) => s.record_failure(),
            Stats::TimeBucketed(s) => s.record_failure(clock),
        }
    }

    pub fn execution_count(&mut self, clock: &dyn Clock) -> u64 {
        match self {
            Stats::Counting(s) => s.execution_count() as u64,
            Stats::TimeBucketed(s) => s.execution_count(clock),
        }
    }

    pub fn success_count(&mut self, clock: &dyn Clock) -> u64 {
        match self {
            Stats::Counting(s) => s.success_count(),
            Stats::TimeBucketed(s) => s.success_count(clock),
        }
    }

    pub fn failure_count(&mut self, clock: &dyn Clock) -> u64 {
        match self {
            Stats::Counting(s) => s.failure_count(),
            Stats::TimeBucketed(s) => s.failure_count(clock),
        }
    }

    pub fn failure_rate_percent(&mut self, clock: &dyn Clock) -> u32 {
        match self {
            Stats::Counting(s) => s.failure_rate_percent(),
            Stats::TimeBucketed(s) => s.failure_rate_percent(clock),
        }
    }

    pub fn success_rate_percent(&mut self, clock: &dyn Clock) -> u32 {
        match self {
            Stats::Counting(s) => s.success_rate_percent(),
            Stats::TimeBucketed(s) => s.success_rate_percent(clock),
        }
    }

    pub fn reset(&mut self, clock: &dyn Clock) {
        match self {
            Stats::Counting(s) => s.reset(),
            Stats::TimeBucketed(s) => s.reset(clock),
        }
    }
}
