use thiserror::Error;

/// Errors returned by the `Retry` service.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The inner service's error, surfaced directly (an abort predicate
    /// matched, the predicate rejected the error as non-retryable, or
    /// `return_last_failure` is set).
    #[error("inner service error: {0}")]
    Inner(E),

    /// All attempts were exhausted (attempt count, `max_duration`, or
    /// cancellation) and `return_last_failure` is not set.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    Exceeded {
        /// The error from the final attempt.
        last_error: E,
        /// Total number of attempts made, including the first.
        attempts: usize,
    },
}

impl<E> RetryError<E> {
    /// Returns true if this is a plain exhaustion without an exceeded wrapper.
    pub fn is_exceeded(&self) -> bool {
        matches!(self, RetryError::Exceeded { .. })
    }

    /// Unwraps to the inner error, discarding attempt-count context.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Inner(e) => e,
            RetryError::Exceeded { last_error, .. } => last_error,
        }
    }
}
