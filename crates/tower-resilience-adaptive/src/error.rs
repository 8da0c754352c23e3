use thiserror::Error;

/// Errors returned by the adaptive throttler services.
#[derive(Debug, Error)]
pub enum AdaptiveError<E> {
    /// The throttler rejected the request probabilistically, or a priority
    /// throttler rejected it because its level fell below the current
    /// rejection threshold.
    #[error("request throttled")]
    Exceeded,

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> AdaptiveError<E> {
    /// Returns true if the request was throttled rather than failing inside
    /// the wrapped service.
    pub fn is_exceeded(&self) -> bool {
        matches!(self, AdaptiveError::Exceeded)
    }

    /// Returns the inner error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            AdaptiveError::Inner(e) => Some(e),
            AdaptiveError::Exceeded => None,
        }
    }
}

impl<E> From<E> for AdaptiveError<E> {
    fn from(err: E) -> Self {
        AdaptiveError::Inner(err)
    }
}
