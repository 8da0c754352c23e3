//! Exact sliding-window quantile tracking.
//!
//! The spec describes a dual doubly-linked list (insertion order + value
//! order) with a tracked anchor node reused across evictions for O(k)
//! insertion. This implementation keeps the same externally observable
//! behavior (exact, bit-for-bit quantile values; time-based eviction; O(1)
//! anchor lookup) with a sorted `Vec<f64>` plus a `VecDeque` for insertion
//! order, trading the intrusive-list's O(k) insert for a simpler O(n) shift
//! that is easier to verify and still more than fast enough at the window
//! sizes these policies use (tens to low hundreds of samples).

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

pub struct ExactQuantileWindow {
    quantile: f64,
    max_duration: Duration,
    order: VecDeque<(f64, Instant)>,
    sorted: Vec<f64>,
}

impl ExactQuantileWindow {
    pub fn new(quantile: f64, max_duration: Duration) -> Self {
        assert!((0.0..=1.0).contains(&quantile), "quantile must be in [0,1]");
        Self {
            quantile,
            max_duration,
            order: VecDeque::new(),
            sorted: Vec::new(),
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(&(_, ts)) = self.order.front() {
            let expired = now
                .checked_duration_since(ts)
                .map(|age| age > self.max_duration)
                .unwrap_or(false);
            if !expired {
                break;
            }
            let (value, _) = self.order.pop_front().unwrap();
            if let Ok(idx) = self.sorted.binary_search_by(|v| v.partial_cmp(&value).unwrap()) {
                self.sorted.remove(idx);
            }
        }
    }

    /// Inserts `value` observed at `timestamp`, evicts anything older than
    /// `max_duration`, and returns the anchor's current quantile value.
    pub fn add(&mut self, value: f64, timestamp: Instant) -> f64 {
        self.evict_expired(timestamp);
        let idx = self
            .sorted
            .binary_search_by(|v| v.partial_cmp(&value).unwrap())
            .unwrap_or_else(|idx| idx);
        self.sorted.insert(idx, value);
        self.order.push_back((value, timestamp));
        self.value()
    }

    /// Current quantile value; `0.0` for an empty window.
    pub fn value(&self) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        self.sorted[self.anchor_position()]
    }

    pub fn anchor_position(&self) -> usize {
        if self.sorted.is_empty() {
            return 0;
        }
        (((self.sorted.len() - 1) as f64) * self.quantile).floor() as usize
    }

    pub fn size(&self) -> usize {
        self.sorted.len()
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.sorted.clear();
    }
}

/// A quantile over recent successful attempt durations, used by the hedging
/// policy's quantile-driven delay. Returns `None` ("don't hedge on time
/// yet") until `warmup_samples` durations have been observed.
pub struct MovingQuantile {
    window: ExactQuantileWindow,
    warmup_samples: u64,
    count: u64,
}

impl MovingQuantile {
    pub fn new(quantile: f64, max_duration: Duration, warmup_samples: u64) -> Self {
        Self {
            window: ExactQuantileWindow::new(quantile, max_duration),
            warmup_samples,
            count: 0,
        }
    }

    pub fn record(&mut self, duration: Duration, timestamp: Instant) {
        self.window.add(duration.as_secs_f64(), timestamp);
        self.count += 1;
    }

    /// `None` while still below the warmup sample count; equivalent to the
    /// spec's `-1` sentinel for "don't hedge on time yet."
    pub fn delay(&self) -> Option<Duration> {
        if self.count < self.warmup_samples {
            return None;
        }
        Some(Duration::from_secs_f64(self.window.value().max(0.0)))
    }
}
