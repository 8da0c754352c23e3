//! The policy-composition engine underlying every `tower-resilience` policy:
//! `Execution` (per-call attempt/cancellation bookkeeping), `PolicyResult`
//! (the value threaded through the stack), the `Policy` trait, and the
//! `Executor<R, E>` that drives a composed stack end to end.
//!
//! This is a standalone, `tower`-independent surface mirroring the original
//! design's abstract `Executor<R>`. The rest of the workspace continues to
//! expose each policy as an ordinary `tower::Layer`; this crate is the seam
//! that lets circuit breaker, retry, and hedge share one cancellation and
//! attempt-bookkeeping model underneath either composition style.

mod cancellation;
mod events;
mod execution;
mod policy;
mod policy_result;

mod executor;

#[cfg(feature = "layer")]
mod layer;

pub use cancellation::CancellationState;
pub use events::ExecutionEvent;
pub use execution::{AlreadyCanceled, Execution};
pub use executor::Executor;
pub use policy::{Handler, Policy};
pub use policy_result::PolicyResult;

#[cfg(feature = "layer")]
pub use layer::service_leaf;
