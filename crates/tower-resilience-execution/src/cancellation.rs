//! Indexed cancellation shared by an `Execution` and every child it spawns
//! for hedging.
//!
//! A policy at index `j` considers the call canceled iff the stored index
//! is `-1` (an external context cancellation, which cancels every policy)
//! or is strictly greater than `j` (an inner policy canceled, which cancels
//! every outer waiter but not itself).

use std::sync::Mutex;
use tokio::sync::Notify;

pub struct CancellationState<R> {
    canceled_index: Mutex<Option<i32>>,
    result: Mutex<Option<R>>,
    notify: Notify,
}

impl<R> Default for CancellationState<R> {
    fn default() -> Self {
        Self {
            canceled_index: Mutex::new(None),
            result: Mutex::new(None),
            notify: Notify::new(),
        }
    }
}

impl<R> CancellationState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to cancel at `policy_index`, storing `result`. Returns
    /// `true` iff this call was the one that performed the cancellation
    /// (CAS semantics: only the first caller wins).
    pub fn cancel(&self, policy_index: i32, result: R) -> bool {
        let mut guard = self.canceled_index.lock().unwrap();
        if guard.is_some() {
            return false;
        }
        *guard = Some(policy_index);
        *self.result.lock().unwrap() = Some(result);
        self.notify.notify_waiters();
        true
    }

    /// Re-arms the signal for a new attempt. No-ops if already canceled,
    /// since a canceled execution never un-cancels.
    pub fn is_canceled_for(&self, policy_index: i32) -> bool {
        match *self.canceled_index.lock().unwrap() {
            Some(-1) => true,
            Some(idx) => idx > policy_index,
            None => false,
        }
    }

    pub fn canceled_index(&self) -> Option<i32> {
        *self.canceled_index.lock().unwrap()
    }

    /// Waits until any cancellation is signaled (at any index). Intended
    /// for use inside `tokio::select!` against a retry/hedge delay timer.
    pub async fn canceled(&self) {
        loop {
            if self.canceled_index.lock().unwrap().is_some() {
                return;
            }
            self.notify.notified().await;
        }
    }

    pub fn take_result(&self) -> Option<R> {
        self.result.lock().unwrap().take()
    }
}
