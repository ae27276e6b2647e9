//! Error types for the planner
//!
//! - [`GenerationError`]: failures reported by the generation service
//! - [`ConfigError`]: unreadable or invalid configuration
//! - [`PlannerError`]: everything a planner operation can return

use roadmap_model::TransitionError;
use roadmap_store::{BackupError, RepositoryError, StorageError};
use std::path::PathBuf;
use std::time::Duration;

/// Failure reported by a [`RoadmapGenerator`](crate::RoadmapGenerator)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Service did not answer in time
    #[error("generation timed out after {after_ms}ms")]
    Timeout {
        /// How long the caller waited
        after_ms: u64,
    },

    /// Service asked the caller to slow down
    #[error("rate limited")]
    RateLimited {
        /// Server-suggested wait, if any
        retry_after_ms: Option<u64>,
    },

    /// Credentials missing or rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Answer could not be turned into learning items
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Check if error is retryable
    ///
    /// Everything but an authentication failure may succeed on a later
    /// attempt.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid TOML for the expected shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Main planner error type
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Planner was disposed
    #[error("planner disposed")]
    Disposed,

    /// No roadmap with that id or sanitized name
    #[error("roadmap not found: {0}")]
    NotFound(String),

    /// Generation service failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Generation skipped because the circuit breaker is open
    #[error("generation service unavailable, retry in {retry_in:?}")]
    BreakerOpen {
        /// Time left until a trial call is admitted
        retry_in: Duration,
    },

    /// Abort observed; the roadmap was left paused
    #[error("generation aborted for roadmap {id}")]
    Aborted {
        /// Paused roadmap
        id: String,
    },

    /// Persistence failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Illegal generation state change
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Backup import or export failed
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PlannerError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_retryable(),
            Self::BreakerOpen { .. } => true,
            _ => false,
        }
    }

    /// Check if the operation stopped because of an abort
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

impl From<RepositoryError> for PlannerError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Storage(e) => Self::Storage(e),
            RepositoryError::Transition(e) => Self::Transition(e),
        }
    }
}
