//! Service implementation for the plain adaptive throttler.

use crate::error::AdaptiveError;
use crate::events::AdaptiveEvent;
use crate::throttle::Throttle;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

#[cfg(feature = "tracing")]
use tracing::debug;

/// A service that probabilistically sheds load based on recent
/// execution/success counts.
///
/// Unlike a circuit breaker, admission is never all-or-nothing: even under
/// sustained failure some fraction of traffic keeps reaching the inner
/// service so recovery can be observed.
pub struct AdaptiveThrottle<S> {
    inner: S,
    throttle: Arc<Throttle>,
}

impl<S> AdaptiveThrottle<S> {
    pub(crate) fn new(inner: S, throttle: Arc<Throttle>) -> Self {
        Self { inner, throttle }
    }

    /// The `throttleProbability` last computed for this instance.
    pub fn throttle_probability(&self) -> f64 {
        self.throttle.throttle_probability()
    }
}

impl<S: Clone> Clone for AdaptiveThrottle<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            throttle: Arc::clone(&self.throttle),
        }
    }
}

impl<S, Req> Service<Req> for AdaptiveThrottle<S>
where
    S: Service<Req>,
{
    type Response = S::Response;
    type Error = AdaptiveError<S::Error>;
    type Future = AdaptiveFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(AdaptiveError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let (admitted, probability) = self.throttle.try_acquire();
        let name = self.throttle.name().map(str::to_owned);

        if !admitted {
            #[cfg(feature = "tracing")]
            debug!(name = ?name, throttle_probability = probability, "request throttled");

            #[cfg(feature = "metrics")]
            metrics::counter!("adaptive_throttle_rejected_total").increment(1);

            self.throttle.emit(&AdaptiveEvent::PermitRejected {
                name,
                throttle_probability: probability,
                timestamp: std::time::Instant::now(),
            });

            return AdaptiveFuture::rejected();
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("adaptive_throttle_admitted_total").increment(1);

        self.throttle.emit(&AdaptiveEvent::PermitGranted {
            name,
            throttle_probability: probability,
            timestamp: std::time::Instant::now(),
        });

        AdaptiveFuture::admitted(self.inner.call(req), Arc::clone(&self.throttle))
    }
}

pin_project! {
    #[project = AdaptiveFutureProj]
    pub enum AdaptiveFuture<F> {
        Rejected,
        Admitted {
            #[pin]
            future: F,
            throttle: Arc<Throttle>,
        },
    }
}

impl<F> AdaptiveFuture<F> {
    fn rejected() -> Self {
        AdaptiveFuture::Rejected
    }

    fn admitted(future: F, throttle: Arc<Throttle>) -> Self {
        AdaptiveFuture::Admitted { future, throttle }
    }
}

impl<F, T, E> Future for AdaptiveFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, AdaptiveError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            AdaptiveFutureProj::Rejected => Poll::Ready(Err(AdaptiveError::Exceeded)),
            AdaptiveFutureProj::Admitted { future, throttle } => future.poll(cx).map(|result| {
                match &result {
                    Ok(_) => throttle.record_success(),
                    Err(_) => throttle.record_failure(),
                }
                result.map_err(AdaptiveError::Inner)
            }),
        }
    }
}
