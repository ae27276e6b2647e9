//! Resilience error types

use std::time::Duration;

/// Outcome of a call made through a [`CircuitBreaker`](crate::CircuitBreaker)
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    /// Breaker is open; the operation was not invoked
    #[error("circuit breaker open, retry in {retry_in:?}")]
    Open {
        /// Time left until the breaker admits a trial call
        retry_in: Duration,
    },

    /// The operation ran and failed
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Whether the call was rejected without running
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The operation's own error, if it ran
    #[inline]
    #[must_use]
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Open { .. } => None,
        }
    }
}

/// Outcome of an abortable retry loop
///
/// Both variants carry the last error the operation returned, unchanged.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Attempts exhausted, or the error was not retryable
    #[error("{0}")]
    Failed(E),

    /// Abort signalled after a failed attempt
    #[error("aborted after failed attempt: {0}")]
    Aborted(E),
}

impl<E> RetryError<E> {
    /// Whether the loop stopped because of an abort
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Last error returned by the operation
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            Self::Failed(e) | Self::Aborted(e) => e,
        }
    }
}
