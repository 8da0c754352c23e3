//! Shared priority-admission types used by the adaptive throttler and the
//! prioritizer that calibrates its rejection threshold.
//!
//! This lives in `tower-resilience-core` rather than either policy crate so
//! that `tower-resilience-adaptive` can accept any `RejectionThreshold`
//! implementation (in practice `tower-resilience-prioritizer::Prioritizer`)
//! without the two crates depending on each other.

use std::ops::RangeInclusive;

/// Source of the current admission threshold a priority-aware limiter
/// checks a request's level against.
pub trait RejectionThreshold: Send + Sync {
    /// Requests below this level are rejected.
    fn rejection_threshold(&self) -> u32;
}

/// Stats a throttler/limiter exposes so a [`RejectionThreshold`] calibrator
/// (in practice a prioritizer) can fold it into a combined rejection rate.
pub trait LimiterStats: Send + Sync {
    /// Fraction of recent requests this limiter rejected, in `[0, 1]`.
    fn rejection_rate(&self) -> f64;
    /// Total requests observed in the current window, used as this
    /// limiter's weight in a weighted average across limiters.
    fn execution_count(&self) -> u64;
    /// This limiter's own configured ceiling on rejection rate; the
    /// combined rate across all limiters is clamped by the smallest one.
    fn max_rejection_rate(&self) -> f64;
}

/// Coarse request priority, mapped to a sub-range of the `0..500` level
/// space used for fine-grained admission decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// The inclusive range of fine-grained levels this priority maps to.
    pub fn level_range(&self) -> RangeInclusive<u32> {
        match self {
            PriorityLevel::Low => 0..=99,
            PriorityLevel::Medium => 100..=199,
            PriorityLevel::High => 200..=299,
            PriorityLevel::Critical => 300..=499,
        }
    }
}
