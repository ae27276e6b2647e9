//! Error types for roadmap persistence
//!
//! Not-found is not an error here: lookups return `Option` and deletes
//! return `bool`.

use roadmap_model::TransitionError;

/// Failure of the underlying key-value medium
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Value could not be written (quota, I/O, permissions)
    #[error("storage write failed for '{key}': {reason}")]
    Write {
        /// Key being written
        key: String,
        /// Medium's explanation
        reason: String,
    },

    /// Value could not be removed
    #[error("storage remove failed for '{key}': {reason}")]
    Remove {
        /// Key being removed
        key: String,
        /// Medium's explanation
        reason: String,
    },

    /// Value could not be encoded before writing
    #[error("failed to encode '{key}': {source}")]
    Encode {
        /// Key the value was meant for
        key: String,
        /// Encoder failure
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create write error for key
    pub fn write(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create remove error for key
    pub fn remove(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Remove {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Repository operation that could not proceed
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Persisting failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Requested generation state change is not allowed
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Backup snapshot rejected before anything was replaced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Payload is not valid JSON
    #[error("malformed backup: {0}")]
    Malformed(String),

    /// Required field absent or of the wrong type
    #[error("backup is missing required field '{0}'")]
    MissingField(&'static str),

    /// A roadmap entry could not be read
    #[error("backup roadmap #{index} is invalid: {reason}")]
    InvalidRoadmap {
        /// Position in the snapshot's `roadmaps`
        index: usize,
        /// Decoder message
        reason: String,
    },

    /// Embedded checksum does not match the roadmaps
    #[error("backup checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Checksum carried by the snapshot
        expected: String,
        /// Checksum of the roadmaps as received
        actual: String,
    },
}

/// Import failure
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Snapshot rejected
    #[error("invalid backup format: {0}")]
    Format(#[from] FormatError),

    /// Replacing the collection failed
    #[error("backup import could not be stored: {0}")]
    Storage(#[from] StorageError),
}
