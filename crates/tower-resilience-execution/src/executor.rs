//! The `Executor<R, E>`: builds a handler by composing a stack of
//! `Policy`s around a user function, then drives one call end to end.

use crate::events::ExecutionEvent;
use crate::execution::Execution;
use crate::policy::{Handler, Policy};
use crate::policy_result::PolicyResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_resilience_core::events::EventListener;
use tower_resilience_core::EventListeners;

/// Composes a stack of policies (outer to inner, matching this workspace's
/// `ServiceBuilder` convention: the first policy added is outermost) around
/// a user function and runs calls through it.
pub struct Executor<R, E> {
    name: String,
    policies: Vec<Arc<dyn Policy<R, E>>>,
    listeners: EventListeners<ExecutionEvent>,
}

impl<R, E> Executor<R, E>
where
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            policies: Vec::new(),
            listeners: EventListeners::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a policy as the new outermost layer (appended after any
    /// previously-added policies, which become more inner).
    pub fn with(mut self, policy: Arc<dyn Policy<R, E>>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn on_complete<L>(mut self, listener: L) -> Self
    where
        L: EventListener<ExecutionEvent> + 'static,
    {
        self.listeners.add(listener);
        self
    }

    fn build_handler<F, Fut>(&self, f: Arc<F>) -> Handler<R, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let leaf: Handler<R, E> = Arc::new(move |exec: Arc<Execution<PolicyResult<R, E>>>| {
            let f = f.clone();
            Box::pin(async move {
                let out = f().await;
                exec.record();
                PolicyResult::from_result(out)
            })
        });
        self.policies
            .iter()
            .rev()
            .fold(leaf, |inner, policy| Arc::clone(policy).wrap(inner))
    }

    /// Runs `f` through the composed policy stack once, returning the
    /// outermost layer's final result.
    pub async fn get<F, Fut>(&self, f: F) -> Result<R, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let handler = self.build_handler(Arc::new(f));
        let exec: Arc<Execution<PolicyResult<R, E>>> = Arc::new(Execution::new());
        let start = exec.start_time();
        let outcome = handler(exec.clone()).await;
        let elapsed = start.elapsed();
        let attempts = exec.attempt_count();
        let success_all = outcome.success_all;
        let now = Instant::now();
        self.listeners.emit(&ExecutionEvent::Complete {
            pattern_name: self.name.clone(),
            timestamp: now,
            attempts,
            elapsed,
            success: success_all,
        });
        if success_all {
            self.listeners.emit(&ExecutionEvent::Success {
                pattern_name: self.name.clone(),
                timestamp: now,
                attempts,
                elapsed,
            });
        } else {
            self.listeners.emit(&ExecutionEvent::Failure {
                pattern_name: self.name.clone(),
                timestamp: now,
                attempts,
                elapsed,
            });
        }
        outcome.into_result()
    }

    /// Convenience for user functions returning `()` on success.
    pub async fn run<F, Fut>(&self, f: F) -> Result<(), E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.get(f).await
    }
}

impl<R, E> Default for Executor<R, E>
where
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
