//! The `Policy` trait: anything that can wrap an inner handler with its own
//! `PreExecute`/`PostExecute` behavior.

use crate::execution::Execution;
use crate::policy_result::PolicyResult;
use futures::future::BoxFuture;
use std::sync::Arc;

/// A handler closure: given a (possibly child) `Execution`, runs the next
/// inner layer and returns its `PolicyResult`. This is the unit every
/// `Policy::wrap` composes: `wrap(inner)` returns a new `Handler` that
/// performs this policy's `PreExecute`/`PostExecute` around a call to
/// `inner`.
pub type Handler<R, E> =
    Arc<dyn Fn(Arc<Execution<PolicyResult<R, E>>>) -> BoxFuture<'static, PolicyResult<R, E>> + Send + Sync>;

/// One layer of the policy stack.
///
/// Implementations receive the fully-formed `inner` handler (everything
/// closer to the user function than this policy) and must return a new
/// handler that performs this policy's admission check, invokes `inner`,
/// and classifies/transforms the result on the way back out — matching
/// `handler(exec) = { if (r := PreExecute(exec)) return r; r := inner(exec);
/// return PostExecute(exec, r) }` from the composition algorithm.
pub trait Policy<R, E>: Send + Sync + 'static
where
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "policy"
    }

    /// The index this policy occupies in the stack, used for indexed
    /// cancellation bookkeeping. Assigned by the `Executor` builder at
    /// composition time.
    fn policy_index(&self) -> i32;

    fn wrap(self: Arc<Self>, inner: Handler<R, E>) -> Handler<R, E>;
}
