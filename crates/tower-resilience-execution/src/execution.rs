//! Per-call execution context shared by every policy in the stack.

use crate::cancellation::CancellationState;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Error returned by `initialize_attempt` when an outer policy already
/// canceled the call before this attempt could start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyCanceled;

/// One per top-level call. Tracks attempt/execution counts and owns the
/// cancellation root shared with every hedge/cancellable child.
pub struct Execution<R> {
    start_time: Instant,
    attempt_start_time: std::sync::Mutex<Instant>,
    attempt_count: AtomicU32,
    execution_count: AtomicU32,
    cancellation: Arc<CancellationState<R>>,
}

impl<R> Execution<R> {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            attempt_start_time: std::sync::Mutex::new(now),
            attempt_count: AtomicU32::new(0),
            execution_count: AtomicU32::new(0),
            cancellation: Arc::new(CancellationState::new()),
        }
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count.load(Ordering::SeqCst)
    }

    pub fn execution_count(&self) -> u32 {
        self.execution_count.load(Ordering::SeqCst)
    }

    /// Begins a new attempt at `policy_index`. Refuses if an outer index
    /// already canceled the call; otherwise increments the attempt counter
    /// and resets the attempt clock.
    pub fn initialize_attempt(&self, policy_index: i32) -> Result<(), AlreadyCanceled> {
        if self.cancellation.is_canceled_for(policy_index) {
            return Err(AlreadyCanceled);
        }
        self.attempt_count.fetch_add(1, Ordering::SeqCst);
        *self.attempt_start_time.lock().unwrap() = Instant::now();
        Ok(())
    }

    pub fn attempt_elapsed(&self) -> std::time::Duration {
        self.attempt_start_time.lock().unwrap().elapsed()
    }

    /// Records a completed attempt (successful or not).
    pub fn record(&self) {
        self.execution_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn cancel(&self, policy_index: i32, result: R) -> bool {
        self.cancellation.cancel(policy_index, result)
    }

    pub fn is_canceled_for(&self, policy_index: i32) -> bool {
        self.cancellation.is_canceled_for(policy_index)
    }

    pub fn cancellation(&self) -> &Arc<CancellationState<R>> {
        &self.cancellation
    }

    /// Produces a child execution for a cancellable inner call (hedge
    /// attempt index 0). Shares the cancellation root; has its own attempt
    /// bookkeeping.
    pub fn copy_for_cancellable(&self) -> Self {
        Self {
            start_time: self.start_time,
            attempt_start_time: std::sync::Mutex::new(Instant::now()),
            attempt_count: AtomicU32::new(0),
            execution_count: AtomicU32::new(0),
            cancellation: self.cancellation.clone(),
        }
    }

    /// Produces a child execution for a hedge attempt (index ≥ 1).
    /// Functionally identical to `copy_for_cancellable`; kept as a distinct
    /// method because the hedge policy fires `onHedge` only for these.
    pub fn copy_for_hedge(&self) -> Self {
        self.copy_for_cancellable()
    }
}

impl<R> Default for Execution<R> {
    fn default() -> Self {
        Self::new()
    }
}
