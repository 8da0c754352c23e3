//! Priority-aware throttler: admission is decided against a calibrated
//! rejection threshold instead of drawing a coin flip, so higher-priority
//! traffic survives longer under pressure.

use crate::config::{ThrottleConfig, ThrottleConfigBuilder};
use crate::error::AdaptiveError;
use crate::events::AdaptiveEvent;
use crate::throttle::Throttle;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_resilience_core::{PriorityLevel, RejectionThreshold};
use tower_service::Service;

#[cfg(feature = "tracing")]
use tracing::debug;

impl ThrottleConfigBuilder {
    /// Builds a [`PriorityThrottleLayer`] whose admission decision compares
    /// each request's level (extracted by `level_fn`) against `prioritizer`'s
    /// current rejection threshold.
    ///
    /// `AcquirePermitWithLevel` semantics: a request is admitted iff `level
    /// >= prioritizer.rejection_threshold()`.
    pub fn build_with_level<Req, F>(
        self,
        prioritizer: Arc<dyn RejectionThreshold>,
        level_fn: F,
    ) -> PriorityThrottleLayer<Req>
    where
        F: Fn(&Req) -> u32 + Send + Sync + 'static,
    {
        PriorityThrottleLayer::new(self.build_config(), prioritizer, Arc::new(level_fn))
    }

    /// Builds a [`PriorityThrottleLayer`] whose admission decision draws a
    /// uniform random level within the range assigned to the priority
    /// `priority_fn` extracts from the request, then delegates to the level
    /// check (`AcquirePermitWithPriority`).
    pub fn build_with_priority<Req, F>(
        self,
        prioritizer: Arc<dyn RejectionThreshold>,
        priority_fn: F,
    ) -> PriorityThrottleLayer<Req>
    where
        F: Fn(&Req) -> PriorityLevel + Send + Sync + 'static,
    {
        let level_fn = move |req: &Req| {
            use rand::Rng;
            let range = priority_fn(req).level_range();
            rand::rng().random_range(range)
        };
        PriorityThrottleLayer::new(self.build_config(), prioritizer, Arc::new(level_fn))
    }
}

type LevelFn<Req> = Arc<dyn Fn(&Req) -> u32 + Send + Sync>;

/// A Tower [`Layer`] that admits requests by comparing a per-request
/// priority level against a [`RejectionThreshold`] calibrated externally
/// (in practice by a prioritizer polling this throttler's own stats via
/// [`tower_resilience_core::LimiterStats`]).
pub struct PriorityThrottleLayer<Req> {
    throttle: Arc<Throttle>,
    prioritizer: Arc<dyn RejectionThreshold>,
    level_fn: LevelFn<Req>,
}

impl<Req> PriorityThrottleLayer<Req> {
    fn new(config: ThrottleConfig, prioritizer: Arc<dyn RejectionThreshold>, level_fn: LevelFn<Req>) -> Self {
        Self {
            throttle: Arc::new(Throttle::new(config)),
            prioritizer,
            level_fn,
        }
    }

    /// Returns a handle to the underlying throttle stats, e.g. to register
    /// with a prioritizer as a [`tower_resilience_core::LimiterStats`] source.
    pub fn throttle(&self) -> Arc<Throttle> {
        Arc::clone(&self.throttle)
    }
}

impl<Req> Clone for PriorityThrottleLayer<Req> {
    fn clone(&self) -> Self {
        Self {
            throttle: Arc::clone(&self.throttle),
            prioritizer: Arc::clone(&self.prioritizer),
            level_fn: Arc::clone(&self.level_fn),
        }
    }
}

impl<S, Req> Layer<S> for PriorityThrottleLayer<Req> {
    type Service = PriorityThrottle<S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        PriorityThrottle {
            inner: service,
            throttle: Arc::clone(&self.throttle),
            prioritizer: Arc::clone(&self.prioritizer),
            level_fn: Arc::clone(&self.level_fn),
        }
    }
}

/// The service produced by [`PriorityThrottleLayer`].
pub struct PriorityThrottle<S, Req> {
    inner: S,
    throttle: Arc<Throttle>,
    prioritizer: Arc<dyn RejectionThreshold>,
    level_fn: LevelFn<Req>,
}

impl<S: Clone, Req> Clone for PriorityThrottle<S, Req> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            throttle: Arc::clone(&self.throttle),
            prioritizer: Arc::clone(&self.prioritizer),
            level_fn: Arc::clone(&self.level_fn),
        }
    }
}

impl<S, Req> Service<Req> for PriorityThrottle<S, Req>
where
    S: Service<Req>,
{
    type Response = S::Response;
    type Error = AdaptiveError<S::Error>;
    type Future = PriorityThrottleFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(AdaptiveError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let level = (self.level_fn)(&req);
        let threshold = self.prioritizer.rejection_threshold();
        let name = self.throttle.name().map(str::to_owned);

        if level < threshold {
            #[cfg(feature = "tracing")]
            debug!(name = ?name, level, threshold, "request rejected by priority threshold");

            #[cfg(feature = "metrics")]
            metrics::counter!("adaptive_priority_throttle_rejected_total").increment(1);

            self.throttle.emit(&AdaptiveEvent::PriorityRejected {
                name,
                level,
                threshold,
                timestamp: std::time::Instant::now(),
            });
            self.throttle.record_failure();

            return PriorityThrottleFuture::rejected();
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("adaptive_priority_throttle_admitted_total").increment(1);

        PriorityThrottleFuture::admitted(self.inner.call(req), Arc::clone(&self.throttle))
    }
}

pin_project! {
    #[project = PriorityThrottleFutureProj]
    pub enum PriorityThrottleFuture<F> {
        Rejected,
        Admitted {
            #[pin]
            future: F,
            throttle: Arc<Throttle>,
        },
    }
}

impl<F> PriorityThrottleFuture<F> {
    fn rejected() -> Self {
        PriorityThrottleFuture::Rejected
    }

    fn admitted(future: F, throttle: Arc<Throttle>) -> Self {
        PriorityThrottleFuture::Admitted { future, throttle }
    }
}

impl<F, T, E> Future for PriorityThrottleFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, AdaptiveError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            PriorityThrottleFutureProj::Rejected => Poll::Ready(Err(AdaptiveError::Exceeded)),
            PriorityThrottleFutureProj::Admitted { future, throttle } => {
                future.poll(cx).map(|result| {
                    match &result {
                        Ok(_) => throttle.record_success(),
                        Err(_) => throttle.record_failure(),
                    }
                    result.map_err(AdaptiveError::Inner)
                })
            }
        }
    }
}
