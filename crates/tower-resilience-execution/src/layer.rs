//! Thin glue between the standalone `Executor<R, E>` and `tower::Service`.
//!
//! The rest of this workspace exposes each policy as its own `tower::Layer`
//! (circuit breaker, retry, hedge); `Executor` is the abstract,
//! Tower-independent surface from the original design. This module lets a
//! `tower::Service` act as the leaf of an `Executor`'s policy stack, for
//! callers who would rather drive composition explicitly than stack
//! `tower::Layer`s.

use std::future::Future;
use tower::Service;
use tower::ServiceExt;

/// Wraps a cloneable `tower::Service` into an async closure suitable for
/// `Executor::get`/`Executor::run`. Each call clones the service (the same
/// pattern `tower-resilience-retry::Retry` already uses to issue repeated
/// attempts against a `Clone` inner service) and awaits readiness before
/// calling it.
pub fn service_leaf<S, Req>(
    service: S,
    request: Req,
) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>
       + Send
       + Sync
       + 'static
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Clone + Send + 'static,
{
    move || {
        let mut svc = service.clone();
        let req = request.clone();
        Box::pin(async move {
            let svc = svc.ready().await?;
            svc.call(req).await
        })
    }
}
