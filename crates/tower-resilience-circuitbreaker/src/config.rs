use crate::events::CircuitBreakerEvent;
use crate::SharedFailureClassifier;
use std::sync::Arc;
use std::time::Duration;
use tower_resilience_core::EventListeners;

/// How the breaker decides to trip from Closed to Open. The three variants
/// are mutually exclusive: setting one of `count_based`/`time_based_absolute`/
/// `time_based_rate` on the builder replaces whichever was set before.
#[derive(Debug, Clone)]
pub enum ThresholdingStrategy {
    /// Fixed-capacity window of the last `capacity` calls; opens once at
    /// least `threshold` of them are failures.
    CountBased { capacity: usize, threshold: u32 },
    /// Calls accumulated over `thresholding_period`; opens once at least
    /// `threshold` executions have landed in the period and at least
    /// `threshold` of them are failures.
    TimeBasedAbsolute {
        threshold: u32,
        thresholding_period: Duration,
    },
    /// Calls accumulated over `thresholding_period`; opens once at least
    /// `execution_threshold` executions have landed in the period and the
    /// failure rate among them is at least `rate_threshold`.
    TimeBasedRate {
        rate_threshold: f64,
        execution_threshold: u32,
        thresholding_period: Duration,
    },
}

impl Default for ThresholdingStrategy {
    fn default() -> Self {
        ThresholdingStrategy::CountBased {
            capacity: 1,
            threshold: 1,
        }
    }
}

/// A function computing the Open-state wait duration from the number of times
/// the circuit has opened so far (1 on the first open). Returning `None` tells
/// the breaker to fall back to its configured default, mirroring the `-1`
/// "use default" sentinel from the wait-duration function contract.
pub type OpenDelayFn = dyn Fn(u32) -> Option<Duration> + Send + Sync;

/// How long the circuit waits in the Open state before probing with a
/// half-open trial.
#[derive(Clone)]
pub enum DelayStrategy {
    /// Always wait the same duration.
    Fixed(Duration),
    /// Compute the wait duration from the open-attempt number; `default` is
    /// used whenever the function opts out by returning `None`.
    Dynamic {
        f: Arc<OpenDelayFn>,
        default: Duration,
    },
}

impl DelayStrategy {
    pub(crate) fn resolve(&self, open_attempt: u32) -> Duration {
        match self {
            DelayStrategy::Fixed(d) => *d,
            DelayStrategy::Dynamic { f, default } => f(open_attempt).unwrap_or(*default),
        }
    }
}

impl std::fmt::Debug for DelayStrategy {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelayStrategy::Fixed(d) => fmt.debug_tuple("Fixed").field(d).finish(),
            DelayStrategy::Dynamic { default, .. } => {
                fmt.debug_struct("Dynamic").field("default", default).finish()
            }
        }
    }
}

/// Configuration for the circuit breaker pattern.
pub struct CircuitBreakerConfig<Res, Err> {
    pub(crate) thresholding: ThresholdingStrategy,
    pub(crate) open_delay: DelayStrategy,
    pub(crate) permitted_calls_in_half_open: usize,
    pub(crate) failure_classifier: SharedFailureClassifier<Res, Err>,
    pub(crate) slow_call_duration_threshold: Option<Duration>,
    pub(crate) slow_call_rate_threshold: f64,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl<Res, Err> CircuitBreakerConfig<Res, Err> {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder<Res, Err> {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for configuring and constructing a circuit breaker.
pub struct CircuitBreakerConfigBuilder<Res, Err> {
    thresholding: ThresholdingStrategy,
    open_delay: DelayStrategy,
    permitted_calls_in_half_open: usize,
    failure_classifier: SharedFailureClassifier<Res, Err>,
    slow_call_duration_threshold: Option<Duration>,
    slow_call_rate_threshold: f64,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl<Res, Err> CircuitBreakerConfigBuilder<Res, Err> {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            thresholding: ThresholdingStrategy::default(),
            open_delay: DelayStrategy::Fixed(Duration::from_secs(60)),
            permitted_calls_in_half_open: 1,
            failure_classifier: Arc::new(|res| res.is_err()),
            slow_call_duration_threshold: None,
            slow_call_rate_threshold: 1.0,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Count-based thresholding: a fixed window of the last `capacity` calls;
    /// the circuit opens once `threshold` of them are failures.
    ///
    /// Default: `capacity = 1, threshold = 1` (opens on the very first
    /// failure).
    pub fn count_based(mut self, capacity: usize, threshold: u32) -> Self {
        self.thresholding = ThresholdingStrategy::CountBased { capacity, threshold };
        self
    }

    /// Time-based-absolute thresholding: calls are accumulated over
    /// `thresholding_period`; the circuit opens once at least `threshold`
    /// executions have landed in the period and at least `threshold` of them
    /// are failures.
    pub fn time_based_absolute(mut self, threshold: u32, thresholding_period: Duration) -> Self {
        self.thresholding = ThresholdingStrategy::TimeBasedAbsolute {
            threshold,
            thresholding_period,
        };
        self
    }

    /// Time-based-rate thresholding: calls are accumulated over
    /// `thresholding_period`; the circuit opens once at least
    /// `execution_threshold` executions have landed in the period and the
    /// failure rate among them is at least `rate_threshold`.
    pub fn time_based_rate(
        mut self,
        rate_threshold: f64,
        execution_threshold: u32,
        thresholding_period: Duration,
    ) -> Self {
        self.thresholding = ThresholdingStrategy::TimeBasedRate {
            rate_threshold,
            execution_threshold,
            thresholding_period,
        };
        self
    }

    /// Sets the duration the circuit remains open before transitioning to half-open.
    ///
    /// Default: 60 seconds
    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.open_delay = DelayStrategy::Fixed(duration);
        self
    }

    /// Computes the Open-state wait duration from the number of times this
    /// breaker has opened (1 on the first open), instead of a fixed duration.
    /// Return `None` from `f` to fall back to `default` for a given attempt.
    pub fn open_delay_fn<F>(mut self, f: F, default: Duration) -> Self
    where
        F: Fn(u32) -> Option<Duration> + Send + Sync + 'static,
    {
        self.open_delay = DelayStrategy::Dynamic {
            f: Arc::new(f),
            default,
        };
        self
    }

    /// Sets the number of permitted concurrent calls in the half-open state.
    ///
    /// Default: 1
    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    /// Sets a custom failure classifier function.
    ///
    /// Default: classifies errors as failures
    pub fn failure_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&Result<Res, Err>) -> bool + Send + Sync + 'static,
    {
        self.failure_classifier = Arc::new(classifier);
        self
    }

    /// Sets the duration threshold for considering a call "slow".
    ///
    /// When set, calls exceeding this duration will be tracked and can trigger
    /// circuit opening based on `slow_call_rate_threshold`.
    ///
    /// Default: None (slow call detection disabled)
    pub fn slow_call_duration_threshold(mut self, duration: Duration) -> Self {
        self.slow_call_duration_threshold = Some(duration);
        self
    }

    /// Sets the slow call rate threshold at which the circuit will open.
    ///
    /// Only applies when `slow_call_duration_threshold` is set.
    ///
    /// Default: 1.0 (100%, effectively disabled)
    pub fn slow_call_rate_threshold(mut self, rate: f64) -> Self {
        self.slow_call_rate_threshold = rate;
        self
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback for state transition events.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        use tower_resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Register a callback for call permitted events.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(tower_resilience_core::FnListener::new(
                move |event: &CircuitBreakerEvent| {
                    if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                        f(*state);
                    }
                },
            ));
        self
    }

    /// Register a callback for call rejected events.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(tower_resilience_core::FnListener::new(
                move |event: &CircuitBreakerEvent| {
                    if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                        f();
                    }
                },
            ));
        self
    }

    /// Register a callback for success recorded events.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(tower_resilience_core::FnListener::new(
                move |event: &CircuitBreakerEvent| {
                    if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                        f(*state);
                    }
                },
            ));
        self
    }

    /// Register a callback for failure recorded events.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(tower_resilience_core::FnListener::new(
                move |event: &CircuitBreakerEvent| {
                    if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                        f(*state);
                    }
                },
            ));
        self
    }

    /// Register a callback for slow call detected events.
    pub fn on_slow_call<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        use tower_resilience_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SlowCallDetected { duration, .. } = event {
                    f(*duration);
                }
            }));
        self
    }

    /// Builds the configuration and returns a CircuitBreakerLayer.
    pub fn build(self) -> crate::layer::CircuitBreakerLayer<Res, Err> {
        let config = CircuitBreakerConfig {
            thresholding: self.thresholding,
            open_delay: self.open_delay,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            failure_classifier: self.failure_classifier,
            slow_call_duration_threshold: self.slow_call_duration_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::layer::CircuitBreakerLayer::new(Arc::new(config))
    }
}

impl<Res, Err> Default for CircuitBreakerConfigBuilder<Res, Err> {
    fn default() -> Self {
        Self::new()
    }
}
