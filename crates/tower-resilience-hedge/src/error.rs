//! Error types for the hedging middleware.

use thiserror::Error;

/// Error type for the hedging service.
#[derive(Debug, Clone, Error)]
pub enum HedgeError<E> {
    /// All hedged attempts failed. Carries the error from whichever attempt
    /// was deemed the winner (the last one to complete, or the first whose
    /// error matched a configured cancel-on predicate).
    #[error("all hedged attempts failed: {0}")]
    AllAttemptsFailed(E),

    /// A single in-flight attempt's error was accepted as the winner by a
    /// configured cancel-on predicate before every attempt finished.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> HedgeError<E> {
    /// Returns `true` if all hedged attempts failed.
    pub fn is_all_attempts_failed(&self) -> bool {
        matches!(self, HedgeError::AllAttemptsFailed(_))
    }

    /// Returns `true` if this is an inner service error.
    pub fn is_inner(&self) -> bool {
        matches!(self, HedgeError::Inner(_))
    }

    /// Get a reference to the inner error.
    pub fn inner(&self) -> &E {
        match self {
            HedgeError::AllAttemptsFailed(e) => e,
            HedgeError::Inner(e) => e,
        }
    }

    /// Convert into the inner error.
    pub fn into_inner(self) -> E {
        match self {
            HedgeError::AllAttemptsFailed(e) => e,
            HedgeError::Inner(e) => e,
        }
    }
}
