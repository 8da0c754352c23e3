//! The value threaded through the composition chain: a result paired with
//! each policy's verdict on it.

/// The outcome of one handler invocation at some layer of the policy stack.
///
/// `complete` means the producing policy has no further attempts left to
/// make (it will not retry or hedge again). `success` is this policy's own
/// verdict; `success_all` is the conjunction of every policy's verdict seen
/// so far, which is what the executor uses to decide `on_success` versus
/// `on_failure` at the top level.
#[derive(Debug, Clone)]
pub struct PolicyResult<R, E> {
    pub result: Option<R>,
    pub error: Option<E>,
    pub complete: bool,
    pub success: bool,
    pub success_all: bool,
}

impl<R, E> PolicyResult<R, E> {
    pub fn ok(result: R) -> Self {
        Self {
            result: Some(result),
            error: None,
            complete: true,
            success: true,
            success_all: true,
        }
    }

    pub fn err(error: E) -> Self {
        Self {
            result: None,
            error: Some(error),
            complete: true,
            success: false,
            success_all: false,
        }
    }

    pub fn from_result(result: Result<R, E>) -> Self {
        match result {
            Ok(r) => Self::ok(r),
            Err(e) => Self::err(e),
        }
    }

    /// Returns a copy marked `complete`, preserving every other field.
    pub fn with_complete(mut self, complete: bool) -> Self
    where
        R: Clone,
        E: Clone,
    {
        self.complete = complete;
        self
    }

    /// Marks this layer's verdict as a failure, folding it into
    /// `success_all` (which can only go from true to false, never back).
    pub fn with_failure(mut self) -> Self {
        self.success = false;
        self.success_all = false;
        self
    }

    pub fn with_success(mut self) -> Self {
        self.success = true;
        self
    }

    /// Folds an outer policy's own verdict into the conjunction carried
    /// from inner layers.
    pub fn fold_success_all(mut self, this_layer_success: bool) -> Self {
        self.success_all = self.success_all && this_layer_success;
        self
    }

    pub fn into_result(self) -> Result<R, E> {
        match (self.result, self.error) {
            (Some(r), _) => Ok(r),
            (None, Some(e)) => Err(e),
            (None, None) => unreachable!("PolicyResult must carry a result or an error"),
        }
    }
}
