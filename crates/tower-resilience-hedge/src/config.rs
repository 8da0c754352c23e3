//! Configuration for the hedging middleware.

use crate::events::HedgeEvent;
use crate::layer::HedgeLayer;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_resilience_core::{EventListener, EventListeners};
use tower_resilience_windows::MovingQuantile;

/// Delay strategy for hedged requests.
#[derive(Clone)]
pub enum HedgeDelay {
    /// Fixed delay before each hedge attempt.
    Fixed(Duration),
    /// No delay - fire all attempts immediately (parallel mode).
    Immediate,
    /// Dynamic delay based on attempt number.
    Dynamic(Arc<dyn Fn(usize) -> Duration + Send + Sync>),
    /// Delay tracks a quantile of recently observed successful durations.
    /// Returns no delay (meaning: don't hedge on a timer this round, only
    /// the primary attempt runs) until `warmup_samples` successes have been
    /// recorded.
    Quantile(Arc<Mutex<MovingQuantile>>),
}

impl HedgeDelay {
    /// Get the delay for the given attempt number (1-indexed). `None` means
    /// the quantile window is still warming up and no hedge should fire yet.
    pub fn get_delay(&self, attempt: usize) -> Option<Duration> {
        match self {
            HedgeDelay::Fixed(d) => Some(*d),
            HedgeDelay::Immediate => Some(Duration::ZERO),
            HedgeDelay::Dynamic(f) => Some(f(attempt)),
            HedgeDelay::Quantile(mq) => mq.lock().unwrap().delay(),
        }
    }

    /// Feeds a successful attempt's duration into the quantile window, if
    /// this strategy tracks one. No-op for the other strategies.
    pub fn record_success(&self, duration: Duration) {
        if let HedgeDelay::Quantile(mq) = self {
            mq.lock().unwrap().record(duration, tokio::time::Instant::now());
        }
    }
}

impl Default for HedgeDelay {
    fn default() -> Self {
        HedgeDelay::Fixed(Duration::from_secs(1))
    }
}

/// Determines whether a result (success or failure) wins the hedge race,
/// canceling every other in-flight attempt.
pub type CancelPredicate<Res, E> = Arc<dyn Fn(&Result<Res, E>) -> bool + Send + Sync>;

/// Configuration for the hedging service.
pub struct HedgeConfig<Req, Res, E> {
    /// Name for metrics/tracing.
    pub(crate) name: Option<String>,
    /// Maximum number of hedged attempts (including original).
    pub(crate) max_hedged_attempts: usize,
    /// Delay before firing each hedge.
    pub(crate) delay: HedgeDelay,
    /// Predicates narrowing which results count as a race winner. Empty
    /// means "first result wins" regardless of success or failure.
    pub(crate) cancel_predicates: Vec<CancelPredicate<Res, E>>,
    /// Event listeners.
    pub(crate) listeners: EventListeners<HedgeEvent>,
    /// Phantom data for type parameters.
    pub(crate) _phantom: PhantomData<(Req, Res, E)>,
}

impl<Req, Res, E> Default for HedgeConfig<Req, Res, E> {
    fn default() -> Self {
        Self {
            name: None,
            max_hedged_attempts: 2,
            delay: HedgeDelay::default(),
            cancel_predicates: Vec::new(),
            listeners: EventListeners::default(),
            _phantom: PhantomData,
        }
    }
}

impl<Req, Res, E> HedgeConfig<Req, Res, E> {
    /// A result wins the race if any configured cancel predicate accepts
    /// it, if none are configured, or if it is the last result to arrive.
    pub(crate) fn is_winner(&self, result: &Result<Res, E>, is_last: bool) -> bool {
        is_last || self.cancel_predicates.is_empty() || self.cancel_predicates.iter().any(|p| p(result))
    }
}

/// Builder for [`HedgeConfig`].
pub struct HedgeConfigBuilder<Req, Res, E> {
    config: HedgeConfig<Req, Res, E>,
}

impl<Req, Res, E> Default for HedgeConfigBuilder<Req, Res, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Res, E> HedgeConfigBuilder<Req, Res, E> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: HedgeConfig::default(),
        }
    }

    /// Set the name for this hedge instance (used in metrics/tracing).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Set the maximum number of hedged attempts (including the original request).
    ///
    /// Default is 2 (1 original + 1 hedge).
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::HedgeLayer;
    ///
    /// // Allow up to 3 parallel attempts
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .max_hedged_attempts(3)
    ///     .build();
    /// ```
    pub fn max_hedged_attempts(mut self, n: usize) -> Self {
        self.config.max_hedged_attempts = n.max(1);
        self
    }

    /// Set a fixed delay before firing hedge requests.
    ///
    /// After this delay, if the primary request hasn't completed,
    /// a hedge request will be fired.
    ///
    /// Default is 1 second.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::HedgeLayer;
    /// use std::time::Duration;
    ///
    /// // Fire hedge after 100ms
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .delay(Duration::from_millis(100))
    ///     .build();
    /// ```
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = HedgeDelay::Fixed(delay);
        self
    }

    /// Fire all hedge requests immediately (parallel mode).
    ///
    /// All requests are fired simultaneously and the first successful
    /// response is returned. Use when latency is critical and you can
    /// afford the additional resource usage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::HedgeLayer;
    ///
    /// // Fire 3 requests immediately
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .no_delay()
    ///     .max_hedged_attempts(3)
    ///     .build();
    /// ```
    pub fn no_delay(mut self) -> Self {
        self.config.delay = HedgeDelay::Immediate;
        self
    }

    /// Set a dynamic delay generator based on attempt number.
    ///
    /// The function receives the attempt number (1-indexed) and returns
    /// the delay before that attempt should fire.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::HedgeLayer;
    /// use std::time::Duration;
    ///
    /// // Increasing delays: 50ms, 100ms, 150ms...
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .delay_fn(|attempt| Duration::from_millis(50 * attempt as u64))
    ///     .max_hedged_attempts(3)
    ///     .build();
    /// ```
    pub fn delay_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.config.delay = HedgeDelay::Dynamic(Arc::new(f));
        self
    }

    /// Drive the hedge delay from a `quantile`-th percentile of recently
    /// observed successful durations, computed over a window `max_duration`
    /// wide. No hedge fires on a timer until `warmup_samples` successes have
    /// been recorded; until then only the primary attempt runs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::HedgeLayer;
    /// use std::time::Duration;
    ///
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .quantile_delay(0.95, Duration::from_secs(60), 10)
    ///     .max_hedged_attempts(1)
    ///     .build();
    /// ```
    pub fn quantile_delay(mut self, quantile: f64, max_duration: Duration, warmup_samples: u64) -> Self {
        self.config.delay = HedgeDelay::Quantile(Arc::new(std::sync::Mutex::new(
            tower_resilience_windows::MovingQuantile::new(quantile, max_duration, warmup_samples),
        )));
        self
    }

    /// Narrow winner selection to successful results matching `predicate`.
    ///
    /// By default any result (success or failure) wins the race as soon as
    /// it arrives. Once any `cancel_on_result`/`cancel_on_errors`/`cancel_if`
    /// predicate is configured, a result only wins early if it matches one
    /// of them; non-matching results keep every hedge running until all
    /// attempts complete.
    pub fn cancel_on_result<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Res) -> bool + Send + Sync + 'static,
    {
        self.config
            .cancel_predicates
            .push(Arc::new(move |r: &Result<Res, E>| matches!(r, Ok(res) if predicate(res))));
        self
    }

    /// Narrow winner selection to failures matching `predicate`. Useful for
    /// letting a permanent error cancel the remaining hedges immediately
    /// instead of waiting out the rest of the race.
    pub fn cancel_on_errors<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.config
            .cancel_predicates
            .push(Arc::new(move |r: &Result<Res, E>| matches!(r, Err(e) if predicate(e))));
        self
    }

    /// Narrow winner selection with a predicate over the full result.
    pub fn cancel_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Result<Res, E>) -> bool + Send + Sync + 'static,
    {
        self.config.cancel_predicates.push(Arc::new(predicate));
        self
    }

    /// Add an event listener for hedge events.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tower_resilience_hedge::{HedgeLayer, HedgeEvent};
    /// use tower_resilience_core::FnListener;
    ///
    /// let layer = HedgeLayer::<(), String, std::io::Error>::builder()
    ///     .on_event(FnListener::new(|event: &HedgeEvent| {
    ///         match event {
    ///             HedgeEvent::HedgeSucceeded { attempt, duration, .. } => {
    ///                 println!("Hedge {} succeeded in {:?}", attempt, duration);
    ///             }
    ///             _ => {}
    ///         }
    ///     }))
    ///     .build();
    /// ```
    pub fn on_event<L>(mut self, listener: L) -> Self
    where
        L: EventListener<HedgeEvent> + 'static,
    {
        self.config.listeners.add(listener);
        self
    }

    /// Build the [`HedgeLayer`].
    pub fn build(self) -> HedgeLayer<Req, Res, E> {
        HedgeLayer::from_config(self.config)
    }
}
