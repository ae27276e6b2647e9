//! Backup export and import
//!
//! An export snapshots the current user's collection verbatim. Import is a
//! destructive replace of the current user's collection: the snapshot is
//! validated completely before the single write, so a rejected snapshot
//! leaves stored data untouched.
//!
//! The backup key and checksum are identity and corruption checks a human
//! can compare, not signatures.

use crate::error::{BackupError, FormatError};
use crate::ids::mint_backup_key;
use crate::repository::RoadmapRepository;
use crate::BACKUP_KEY_KEY;
use chrono::{DateTime, Utc};
use roadmap_model::RoadmapDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Snapshot format version written by [`BackupCodec::export`]
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Portable copy of a user's collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    /// Identity token for this export
    pub backup_key: String,
    /// Exporting user
    pub user_id: String,
    /// Collection at export time
    pub roadmaps: Vec<RoadmapDocument>,
    /// Export time
    pub exported_at: DateTime<Utc>,
    /// Format version
    pub version: String,
    /// Hex BLAKE3 digest of `roadmaps`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Export/import over a repository
#[derive(Debug, Clone)]
pub struct BackupCodec {
    repository: Arc<RoadmapRepository>,
}

impl BackupCodec {
    /// Create codec over a repository
    #[inline]
    #[must_use]
    pub fn new(repository: Arc<RoadmapRepository>) -> Self {
        Self { repository }
    }

    /// Snapshot the current collection
    ///
    /// Stored roadmaps are not modified. The fresh backup key is recorded
    /// under [`BACKUP_KEY_KEY`]; failing to record it only logs.
    #[must_use]
    pub fn export(&self) -> BackupSnapshot {
        let scope = self.repository.scope();
        let user_id = scope.user_id();
        let roadmaps = self.repository.get_all();
        let exported_at = Utc::now();
        let backup_key = mint_backup_key(&user_id, exported_at);

        let checksum = serde_json::to_value(&roadmaps)
            .map(|v| checksum_of(&v))
            .inspect_err(|e| tracing::warn!(error = %e, "Exporting without checksum"))
            .ok();

        if let Err(e) = self.repository.store().set(BACKUP_KEY_KEY, &backup_key) {
            tracing::warn!(error = %e, "Failed to record backup key");
        }

        tracing::info!(user_id = %user_id, count = roadmaps.len(), backup_key = %backup_key, "Exported roadmaps");
        BackupSnapshot {
            backup_key,
            user_id,
            roadmaps,
            exported_at,
            version: SNAPSHOT_VERSION.to_string(),
            checksum,
        }
    }

    /// Key of the most recent export, if any
    #[must_use]
    pub fn last_backup_key(&self) -> Option<String> {
        self.repository.store().get(BACKUP_KEY_KEY)
    }

    /// Replace the current collection with a snapshot's roadmaps
    ///
    /// Each roadmap is re-stamped with the current user id and an
    /// `importedAt` time; the previous owner is kept in `originalUserId`.
    /// Returns the number of roadmaps now stored.
    ///
    /// # Errors
    /// - `BackupError::Format` if the snapshot is missing `roadmaps` or
    ///   `userId`, an entry is unreadable, or the checksum does not match
    /// - `BackupError::Storage` if the collection cannot be written
    pub fn import(&self, snapshot: &Value) -> Result<usize, BackupError> {
        let roadmaps = validate_snapshot(snapshot)?;
        let source_user = snapshot
            .get("userId")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let imported_at = Utc::now();
        let mut docs = Vec::with_capacity(roadmaps.len());
        for (index, entry) in roadmaps.iter().enumerate() {
            let mut doc: RoadmapDocument =
                serde_json::from_value(entry.clone()).map_err(|e| FormatError::InvalidRoadmap {
                    index,
                    reason: e.to_string(),
                })?;
            if doc.original_user_id.is_none() {
                let previous_owner = if doc.user_id.is_empty() {
                    source_user.to_string()
                } else {
                    doc.user_id.clone()
                };
                doc.original_user_id = Some(previous_owner);
            }
            doc.imported_at = Some(imported_at);
            docs.push(doc);
        }

        let count = self.repository.replace_all(docs)?;
        tracing::info!(count, source_user, "Imported roadmaps");
        Ok(count)
    }

    /// Import a typed snapshot
    ///
    /// # Errors
    /// See [`BackupCodec::import`]
    pub fn import_snapshot(&self, snapshot: &BackupSnapshot) -> Result<usize, BackupError> {
        let value =
            serde_json::to_value(snapshot).map_err(|e| FormatError::Malformed(e.to_string()))?;
        self.import(&value)
    }

    /// Import snapshot JSON text
    ///
    /// # Errors
    /// `FormatError::Malformed` for unparseable text, otherwise see
    /// [`BackupCodec::import`]
    pub fn import_json(&self, raw: &str) -> Result<usize, BackupError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| FormatError::Malformed(e.to_string()))?;
        self.import(&value)
    }
}

fn validate_snapshot(snapshot: &Value) -> Result<&Vec<Value>, FormatError> {
    let roadmaps = snapshot
        .get("roadmaps")
        .and_then(Value::as_array)
        .ok_or(FormatError::MissingField("roadmaps"))?;
    snapshot
        .get("userId")
        .and_then(Value::as_str)
        .ok_or(FormatError::MissingField("userId"))?;

    if let Some(expected) = snapshot.get("checksum").and_then(Value::as_str) {
        let actual = checksum_of(&snapshot["roadmaps"]);
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(FormatError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }
    Ok(roadmaps)
}

fn checksum_of(roadmaps: &Value) -> String {
    let canonical = roadmaps.to_string();
    hex::encode(blake3::hash(canonical.as_bytes()).as_bytes())
}
