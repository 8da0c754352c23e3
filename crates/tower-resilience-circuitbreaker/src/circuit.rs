use crate::config::{CircuitBreakerConfig, ThresholdingStrategy};
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_resilience_windows::{Clock, Stats, SystemClock};

/// Number of buckets a time-based thresholding window is split into.
/// Matches the bucket-count convention used by `tower-resilience-adaptive`'s
/// throttler for the same `TimeBucketedStats` primitive.
const TIME_BUCKET_COUNT: usize = 10;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a limited number of calls are allowed.
    HalfOpen = 2,
}

/// Snapshot of circuit breaker metrics for observability.
///
/// This struct provides a point-in-time view of the circuit breaker's internal state
/// without requiring async access. All fields represent a consistent snapshot taken
/// when the metrics were retrieved.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    /// Current state of the circuit breaker.
    pub state: CircuitState,
    /// Total number of recorded calls in the sliding window.
    pub total_calls: usize,
    /// Number of failed calls in the sliding window.
    pub failure_count: usize,
    /// Number of successful calls in the sliding window.
    pub success_count: usize,
    /// Number of slow calls in the sliding window.
    pub slow_call_count: usize,
    /// Current failure rate (0.0 to 1.0).
    pub failure_rate: f64,
    /// Current slow call rate (0.0 to 1.0).
    pub slow_call_rate: f64,
    /// Time since the last state transition.
    pub time_since_state_change: Duration,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed, // Default to Closed for safety
        }
    }
}

fn fresh_stats(thresholding: &ThresholdingStrategy, clock: &dyn Clock) -> Stats {
    match thresholding {
        ThresholdingStrategy::CountBased { capacity, .. } => Stats::count_based((*capacity).max(1)),
        ThresholdingStrategy::TimeBasedAbsolute {
            thresholding_period, ..
        }
        | ThresholdingStrategy::TimeBasedRate {
            thresholding_period, ..
        } => Stats::time_based(TIME_BUCKET_COUNT, *thresholding_period, clock.now()),
    }
}

fn fresh_half_open_stats(permitted_calls_in_half_open: usize) -> Stats {
    Stats::count_based(permitted_calls_in_half_open.max(1))
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    clock: Arc<dyn Clock>,
    // Success/failure outcomes for the active thresholding window; replaced
    // with a fresh instance on every state transition.
    stats: Stats,
    // Slow/non-slow outcomes over the same window shape as `stats`, present
    // only while `slow_call_duration_threshold` is configured.
    slow_stats: Option<Stats>,
    // Remaining half-open concurrency permits: decremented on `try_acquire`,
    // incremented back once the corresponding result is recorded. Distinct
    // from `stats`, which only updates once a result lands.
    half_open_permits: usize,
    // Number of times this breaker has transitioned into Open, fed to the
    // configured open-delay function as its attempt number.
    open_attempt: u32,
    // Delay resolved at the moment Open was entered; `try_acquire` compares
    // against it rather than re-resolving a `Dynamic` strategy every call.
    current_open_delay: Duration,
}

impl Circuit {
    /// Builds a fresh `Circuit` tracking its own state atomic, for use
    /// outside a `CircuitBreaker` (unit tests).
    #[cfg(test)]
    pub fn new<Res, Err>(config: &CircuitBreakerConfig<Res, Err>) -> Self {
        Self::new_with_atomic(Arc::new(AtomicU8::new(CircuitState::Closed as u8)), config)
    }

    pub(crate) fn new_with_atomic<Res, Err>(
        state_atomic: Arc<AtomicU8>,
        config: &CircuitBreakerConfig<Res, Err>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let stats = fresh_stats(&config.thresholding, clock.as_ref());
        let slow_stats = config
            .slow_call_duration_threshold
            .map(|_| fresh_stats(&config.thresholding, clock.as_ref()));
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            stats,
            slow_stats,
            half_open_permits: config.permitted_calls_in_half_open.max(1),
            clock,
            open_attempt: 0,
            current_open_delay: Duration::ZERO,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Time remaining before an Open circuit will admit a half-open trial.
    /// Zero in any other state.
    pub fn remaining_delay(&self) -> Duration {
        if self.state != CircuitState::Open {
            return Duration::ZERO;
        }
        self.current_open_delay
            .saturating_sub(self.last_state_change.elapsed())
    }

    /// Returns a snapshot of the current circuit breaker metrics.
    pub fn metrics<Res, Err>(&mut self, _config: &CircuitBreakerConfig<Res, Err>) -> CircuitMetrics {
        let clock = Arc::clone(&self.clock);
        let total_calls = self.stats.execution_count(clock.as_ref()) as usize;
        let failure_count = self.stats.failure_count(clock.as_ref()) as usize;
        let success_count = self.stats.success_count(clock.as_ref()) as usize;
        let slow_call_count = self
            .slow_stats
            .as_mut()
            .map(|s| s.failure_count(clock.as_ref()) as usize)
            .unwrap_or(0);

        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };

        let slow_call_rate = if total_calls > 0 {
            slow_call_count as f64 / total_calls as f64
        } else {
            0.0
        };

        CircuitMetrics {
            state: self.state,
            total_calls,
            failure_count,
            success_count,
            slow_call_count,
            failure_rate,
            slow_call_rate,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn record<Res, Err>(
        &mut self,
        config: &CircuitBreakerConfig<Res, Err>,
        duration: Duration,
        is_failure: bool,
    ) {
        let is_slow = config
            .slow_call_duration_threshold
            .map(|threshold| duration >= threshold)
            .unwrap_or(false);

        if is_failure {
            self.stats.record_failure(self.clock.as_ref());
        } else {
            self.stats.record_success(self.clock.as_ref());
        }
        if let Some(slow_stats) = self.slow_stats.as_mut() {
            if is_slow {
                slow_stats.record_failure(self.clock.as_ref());
            } else {
                slow_stats.record_success(self.clock.as_ref());
            }
        }

        if is_slow {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::SlowCallDetected {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                    state: self.state,
                });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_slow_calls_total", "circuitbreaker" => config.name.clone())
                .increment(1);
        }

        config.event_listeners.emit(&if is_failure {
            CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            }
        } else {
            CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            }
        });

        #[cfg(feature = "metrics")]
        {
            let outcome = if is_failure { "failure" } else { "success" };
            counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => outcome).increment(1);
            histogram!("circuitbreaker_call_duration_seconds", "circuitbreaker" => config.name.clone())
                .record(duration.as_secs_f64());
        }

        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_permits = (self.half_open_permits + 1)
                    .min(config.permitted_calls_in_half_open.max(1));
                if is_failure {
                    self.transition_to(CircuitState::Open, config);
                } else {
                    let successes = self.stats.success_count(self.clock.as_ref());
                    if successes >= config.permitted_calls_in_half_open as u64 {
                        self.transition_to(CircuitState::Closed, config);
                    }
                }
            }
            CircuitState::Closed => {
                self.evaluate_closed(config);
            }
            CircuitState::Open => {
                // A straggling half-open trial can complete after the breaker has
                // already reopened; its result is recorded for observability but
                // does not re-evaluate thresholds.
            }
        }
    }

    pub fn record_success<Res, Err>(
        &mut self,
        config: &CircuitBreakerConfig<Res, Err>,
        duration: Duration,
    ) {
        self.record(config, duration, false);
    }

    pub fn record_failure<Res, Err>(
        &mut self,
        config: &CircuitBreakerConfig<Res, Err>,
        duration: Duration,
    ) {
        self.record(config, duration, true);
    }

    pub fn try_acquire<Res, Err>(&mut self, config: &CircuitBreakerConfig<Res, Err>) -> bool {
        match self.state {
            CircuitState::Closed => {
                config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallPermitted {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        state: self.state,
                    });
                true
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= self.current_open_delay {
                    self.transition_to(CircuitState::HalfOpen, config);
                    // `transition_to` reset `half_open_permits` to the full
                    // budget; this call consumes one of them immediately.
                    self.half_open_permits = self.half_open_permits.saturating_sub(1);
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                    true
                } else {
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                        });
                    false
                }
            }
            CircuitState::HalfOpen => {
                let permitted = self.half_open_permits > 0;
                if permitted {
                    self.half_open_permits -= 1;
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                } else {
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            pattern_name: config.name.clone(),
                            timestamp: Instant::now(),
                        });
                }
                permitted
            }
        }
    }

    pub fn force_open<Res, Err>(&mut self, config: &CircuitBreakerConfig<Res, Err>) {
        self.transition_to(CircuitState::Open, config);
    }

    pub fn force_closed<Res, Err>(&mut self, config: &CircuitBreakerConfig<Res, Err>) {
        self.transition_to(CircuitState::Closed, config);
    }

    pub fn reset<Res, Err>(&mut self, config: &CircuitBreakerConfig<Res, Err>) {
        self.transition_to(CircuitState::Closed, config);
    }

    fn transition_to<Res, Err>(
        &mut self,
        state: CircuitState,
        config: &CircuitBreakerConfig<Res, Err>,
    ) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(from = ?from_state, to = ?state, "Circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => match from_state {
                    CircuitState::Closed => "Closed",
                    CircuitState::Open => "Open",
                    CircuitState::HalfOpen => "HalfOpen",
                },
                "to" => match state {
                    CircuitState::Closed => "Closed",
                    CircuitState::Open => "Open",
                    CircuitState::HalfOpen => "HalfOpen",
                }
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone(), "state" => match state {
                CircuitState::Closed => "Closed",
                CircuitState::Open => "Open",
                CircuitState::HalfOpen => "HalfOpen",
            })
            .set(1.0);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();

        match state {
            CircuitState::Open => {
                self.open_attempt += 1;
                self.current_open_delay = config.open_delay.resolve(self.open_attempt);
                self.half_open_permits = 0;
            }
            CircuitState::Closed => {
                self.open_attempt = 0;
                self.stats = fresh_stats(&config.thresholding, self.clock.as_ref());
                self.slow_stats = config
                    .slow_call_duration_threshold
                    .map(|_| fresh_stats(&config.thresholding, self.clock.as_ref()));
            }
            CircuitState::HalfOpen => {
                self.stats = fresh_half_open_stats(config.permitted_calls_in_half_open);
                self.slow_stats = None;
                self.half_open_permits = config.permitted_calls_in_half_open.max(1);
            }
        }
    }

    fn evaluate_closed<Res, Err>(&mut self, config: &CircuitBreakerConfig<Res, Err>) {
        let clock = Arc::clone(&self.clock);

        let should_open = match &config.thresholding {
            ThresholdingStrategy::CountBased { threshold, .. } => {
                self.stats.failure_count(clock.as_ref()) >= *threshold as u64
            }
            ThresholdingStrategy::TimeBasedAbsolute { threshold, .. } => {
                let executions = self.stats.execution_count(clock.as_ref());
                executions >= *threshold as u64
                    && self.stats.failure_count(clock.as_ref()) >= *threshold as u64
            }
            ThresholdingStrategy::TimeBasedRate {
                rate_threshold,
                execution_threshold,
                ..
            } => {
                let executions = self.stats.execution_count(clock.as_ref());
                executions >= *execution_threshold as u64 && {
                    let rate = self.stats.failure_rate_percent(clock.as_ref()) as f64 / 100.0;
                    rate >= *rate_threshold
                }
            }
        };

        let slow_should_open = match self.slow_stats.as_mut() {
            Some(slow_stats) => {
                let executions = slow_stats.execution_count(clock.as_ref());
                executions > 0 && {
                    let rate = slow_stats.failure_rate_percent(clock.as_ref()) as f64 / 100.0;
                    rate >= config.slow_call_rate_threshold
                }
            }
            None => false,
        };

        if should_open || slow_should_open {
            self.transition_to(CircuitState::Open, config);
        }
    }
}
