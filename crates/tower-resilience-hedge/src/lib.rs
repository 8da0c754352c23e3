//! Hedging middleware for Tower services.
//!
//! Hedging reduces tail latency by executing parallel redundant requests.
//! Instead of waiting for a slow request to complete, hedging fires additional
//! requests after a configurable delay and returns whichever completes first.
//!
//! # Overview
//!
//! The hedging pattern is useful when:
//! - Tail latency (P99/P999) is critical
//! - Operations are idempotent and safe to retry
//! - You can trade increased resource usage for lower latency
//!
//! # Modes
//!
//! ## Latency Mode (delay > 0)
//!
//! Wait a specified duration before firing hedge requests. This is the default
//! and most common mode - it only sends extra requests if the primary is slow.
//!
//! ```rust,no_run
//! use tower_resilience_hedge::HedgeLayer;
//! use std::time::Duration;
//!
//! // Fire a hedge request if primary takes > 100ms
//! let layer = HedgeLayer::<(), String, std::io::Error>::builder()
//!     .delay(Duration::from_millis(100))
//!     .max_hedged_attempts(2)
//!     .build();
//! ```
//!
//! ## Parallel Mode (delay = 0)
//!
//! Fire all requests simultaneously and return the fastest response.
//! Use when latency is critical and you can afford the resource cost.
//!
//! ```rust,no_run
//! use tower_resilience_hedge::HedgeLayer;
//!
//! // Fire 3 requests immediately, return fastest
//! let layer = HedgeLayer::<(), String, std::io::Error>::builder()
//!     .no_delay()
//!     .max_hedged_attempts(3)
//!     .build();
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tower::{Service, ServiceExt, Layer};
//! use tower_resilience_hedge::HedgeLayer;
//! use std::time::Duration;
//!
//! // Define a simple cloneable error type
//! #[derive(Clone, Debug)]
//! struct MyError;
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "MyError")
//!     }
//! }
//! impl std::error::Error for MyError {}
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a service that sometimes responds slowly
//! let service = tower::service_fn(|req: String| async move {
//!     // Simulate variable latency
//!     Ok::<_, MyError>(format!("response: {}", req))
//! });
//!
//! // Wrap with hedging - fire hedge after 50ms
//! let hedge = HedgeLayer::<String, String, MyError>::builder()
//!     .delay(Duration::from_millis(50))
//!     .max_hedged_attempts(2)
//!     .build();
//!
//! let mut service = hedge.layer(service);
//!
//! let response = service.ready().await?.call("hello".to_string()).await?;
//! println!("Got response: {}", response);
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! By default, the first attempt to complete — success or failure — wins
//! the race and aborts every other in-flight attempt. Use
//! [`HedgeConfigBuilder::cancel_on_result`], [`HedgeConfigBuilder::cancel_on_errors`],
//! or [`HedgeConfigBuilder::cancel_if`] to narrow this so that only results
//! matching a predicate win early; non-matching results keep every attempt
//! running until all of them complete.
//!
//! # Quantile-driven delay
//!
//! Instead of a fixed or function-based delay, [`HedgeConfigBuilder::quantile_delay`]
//! tracks a quantile of recently observed successful durations and hedges
//! only once the primary is running slower than that threshold. The
//! quantile window needs a warmup period; until it has enough samples, no
//! hedge is fired for that request.

mod config;
mod error;
mod events;
mod layer;

pub use config::{CancelPredicate, HedgeConfig, HedgeConfigBuilder, HedgeDelay};
pub use error::HedgeError;
pub use events::HedgeEvent;
pub use layer::HedgeLayer;

use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::Service;

/// Hedging service that wraps an inner service.
///
/// This service executes parallel redundant requests to reduce tail latency.
/// It fires additional "hedge" requests after a configurable delay and returns
/// whichever request completes first successfully.
pub struct Hedge<S, Req, Res, E> {
    inner: S,
    config: Arc<HedgeConfig<Req, Res, E>>,
}

impl<S, Req, Res, E> Hedge<S, Req, Res, E> {
    /// Create a new Hedge service with the given configuration.
    pub fn new(inner: S, config: HedgeConfig<Req, Res, E>) -> Self {
        Self {
            inner,
            config: Arc::new(config),
        }
    }
}

impl<S: Clone, Req, Res, E> Clone for Hedge<S, Req, Res, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, Req, Res, E> Service<Req> for Hedge<S, Req, Res, E>
where
    S: Service<Req, Response = Res, Error = E> + Clone + Send + 'static,
    S::Future: Send,
    Req: Clone + Send + Sync + 'static,
    Res: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Response = Res;
    type Error = HedgeError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(HedgeError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let config = Arc::clone(&self.config);
        let inner = self.inner.clone();
        // Replace the clone we just made with the ready service
        let inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move { execute_with_hedging(inner, req, config).await })
    }
}

/// Execute the request with hedging strategy
async fn execute_with_hedging<S, Req, Res, E>(
    service: S,
    req: Req,
    config: Arc<HedgeConfig<Req, Res, E>>,
) -> Result<Res, HedgeError<E>>
where
    S: Service<Req, Response = Res, Error = E> + Clone + Send + 'static,
    S::Future: Send,
    Req: Clone + Send + 'static,
    Res: Send + 'static,
    E: Clone + Send + 'static,
{
    use tokio::sync::mpsc;

    let max_attempts = config.max_hedged_attempts;
    let start = Instant::now();

    // Emit primary started event
    config.listeners.emit(&HedgeEvent::PrimaryStarted {
        name: config.name.clone(),
        timestamp: Instant::now(),
    });

    // Channel to collect results from all attempts
    let (tx, mut rx) = mpsc::channel::<(usize, Result<Res, E>)>(max_attempts);

    // Every spawned attempt's handle, so the winner can abort whatever is
    // still running instead of leaving it to complete in the background.
    let mut handles: Vec<tokio::task::JoinHandle<()>> = Vec::with_capacity(max_attempts);

    // Spawn primary request
    let mut service_clone = service.clone();
    let req_clone = req.clone();
    let tx_clone = tx.clone();
    handles.push(tokio::spawn(async move {
        let result = service_clone.call(req_clone).await;
        let _ = tx_clone.send((0, result)).await;
    }));

    // Track spawned hedge tasks
    let mut hedges_spawned: usize = 0;
    let mut primary_error: Option<E> = None;

    // A result "wins" the race (and cancels every other in-flight attempt)
    // when it's accepted by `handle_result` below.
    let mut results_received: usize = 0;

    // Handles one arrived result: records quantile data, emits the right
    // event, and decides whether this result wins the race outright. Errors
    // that don't win are folded into `primary_error`/`last_error` so the
    // eventual `AllAttemptsFailed` has something to report.
    macro_rules! handle_result {
        ($attempt:expr, $result:expr, $hedges_cancelled:expr) => {{
            results_received += 1;
            let is_last = results_received >= max_attempts;
            if config.is_winner(&$result, is_last) {
                match $result {
                    Ok(res) => {
                        let duration = start.elapsed();
                        config.delay.record_success(duration);
                        if $attempt == 0 {
                            config.listeners.emit(&HedgeEvent::PrimarySucceeded {
                                name: config.name.clone(),
                                duration,
                                hedges_cancelled: $hedges_cancelled,
                                timestamp: Instant::now(),
                            });
                        } else {
                            config.listeners.emit(&HedgeEvent::HedgeSucceeded {
                                name: config.name.clone(),
                                attempt: $attempt,
                                duration,
                                primary_cancelled: true,
                                timestamp: Instant::now(),
                            });
                        }
                        for h in &handles {
                            h.abort();
                        }
                        return Ok(res);
                    }
                    Err(e) => {
                        for h in &handles {
                            h.abort();
                        }
                        if is_last {
                            config.listeners.emit(&HedgeEvent::AllFailed {
                                name: config.name.clone(),
                                attempts: results_received,
                                timestamp: Instant::now(),
                            });
                            return Err(HedgeError::AllAttemptsFailed(e));
                        }
                        // A cancel-on predicate accepted this failure as
                        // decisive before every attempt finished.
                        return Err(HedgeError::Inner(e));
                    }
                }
            } else if let Err(e) = $result {
                if $attempt == 0 {
                    primary_error = Some(e);
                }
            }
        }};
    }

    // Get delay for first hedge
    let first_delay = config.delay.get_delay(1);

    // If we have more attempts and there's a delay, set up hedge timing
    if max_attempts > 1 {
        match first_delay {
            Some(delay) if delay > Duration::ZERO => {
                // Latency mode: wait for delay or result
                let mut delay_fut = std::pin::pin!(tokio::time::sleep(delay));

                'race: loop {
                    tokio::select! {
                        biased;

                        // Check for results
                        Some((attempt, result)) = rx.recv() => {
                            handle_result!(attempt, result, hedges_spawned);
                        }

                        // Delay elapsed, spawn hedge
                        _ = &mut delay_fut, if hedges_spawned + 1 < max_attempts => {
                            hedges_spawned += 1;
                            let attempt_num = hedges_spawned;

                            config.listeners.emit(&HedgeEvent::HedgeStarted {
                                name: config.name.clone(),
                                attempt: attempt_num,
                                delay,
                                timestamp: Instant::now(),
                            });

                            let mut svc = service.clone();
                            let r = req.clone();
                            let tx_c = tx.clone();
                            handles.push(tokio::spawn(async move {
                                let result = svc.call(r).await;
                                let _ = tx_c.send((attempt_num, result)).await;
                            }));

                            // Set up next delay if more hedges available
                            if hedges_spawned + 1 < max_attempts {
                                match config.delay.get_delay(hedges_spawned + 1) {
                                    Some(next_delay) => delay_fut.set(tokio::time::sleep(next_delay)),
                                    None => break 'race,
                                }
                            }
                        }

                        else => break 'race,
                    }
                }

                // No more hedges to spawn (or the quantile window went cold
                // mid-race); just wait out the remaining results.
                while let Some((attempt, result)) = rx.recv().await {
                    handle_result!(attempt, result, hedges_spawned);
                }
            }
            Some(_) => {
                // Parallel mode: spawn all hedges immediately
                for i in 1..max_attempts {
                    hedges_spawned += 1;

                    config.listeners.emit(&HedgeEvent::HedgeStarted {
                        name: config.name.clone(),
                        attempt: i,
                        delay: Duration::ZERO,
                        timestamp: Instant::now(),
                    });

                    let mut svc = service.clone();
                    let r = req.clone();
                    let tx_c = tx.clone();
                    handles.push(tokio::spawn(async move {
                        let result = svc.call(r).await;
                        let _ = tx_c.send((i, result)).await;
                    }));
                }
            }
            None => {
                // Quantile window still cold: no hedges this round, only
                // the primary attempt is in flight.
            }
        }
    }

    // Drop our sender so channel closes when all tasks complete
    drop(tx);

    // Wait for the winning result or for every attempt to fail.
    while let Some((attempt, result)) = rx.recv().await {
        handle_result!(attempt, result, hedges_spawned);
    }

    // All attempts failed and none won outright; report the primary's
    // error if we have it, otherwise whichever non-winning error arrived.
    Err(HedgeError::AllAttemptsFailed(
        primary_error.expect("at least one error should exist"),
    ))
}
