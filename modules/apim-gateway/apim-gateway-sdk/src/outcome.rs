//! Explicit result type for session queries.

use crate::error::ApimError;

/// Outcome of a query operation.
///
/// Queries never panic and never hide the cause of a failure: callers match
/// on the variant, or collapse it with [`into_result`](Self::into_result) or
/// [`into_option`](Self::into_option).
#[derive(Debug)]
#[must_use]
pub enum QueryOutcome<T> {
    /// The query produced a value.
    Found(T),
    /// The query ran but there was nothing to return. Carries a description
    /// of what was looked for.
    NotFound(String),
    /// The query could not be completed.
    Failed(ApimError),
}

impl<T> QueryOutcome<T> {
    /// Returns `true` for [`QueryOutcome::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns `true` for [`QueryOutcome::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Borrow the value if found.
    #[must_use]
    pub fn as_found(&self) -> Option<&T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound(_) | Self::Failed(_) => None,
        }
    }

    /// Borrow the failure cause if the query failed.
    #[must_use]
    pub fn error(&self) -> Option<&ApimError> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Found(_) | Self::NotFound(_) => None,
        }
    }

    /// Drop the distinction between "not found" and "failed".
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound(_) | Self::Failed(_) => None,
        }
    }

    /// Convert into a `Result`, turning "not found" into [`ApimError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns the failure cause, or `ApimError::NotFound` with the
    /// description of what was looked for.
    pub fn into_result(self) -> Result<T, ApimError> {
        match self {
            Self::Found(v) => Ok(v),
            Self::NotFound(what) => Err(ApimError::NotFound(what)),
            Self::Failed(e) => Err(e),
        }
    }

    /// Map the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryOutcome<U> {
        match self {
            Self::Found(v) => QueryOutcome::Found(f(v)),
            Self::NotFound(what) => QueryOutcome::NotFound(what),
            Self::Failed(e) => QueryOutcome::Failed(e),
        }
    }
}

impl<T> From<Result<T, ApimError>> for QueryOutcome<T> {
    fn from(result: Result<T, ApimError>) -> Self {
        match result {
            Ok(v) => Self::Found(v),
            Err(e) => Self::Failed(e),
        }
    }
}
