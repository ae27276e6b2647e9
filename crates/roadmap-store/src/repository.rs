//! Roadmap repository
//!
//! All users' collections live in one JSON record under [`DATA_KEY`]:
//! `{ "<userId>": [RoadmapDocument, ...] }`. Every operation reads that
//! record, touches only the current user's slot and writes the whole
//! record back in a single `set` (last writer wins).
//!
//! Within a slot `id` and `sanitizedName` are unique: a save that collides
//! on either replaces the existing entry in place.
//!
//! Entries that cannot be decoded (written by a newer client, say) are
//! hidden from reads but written back untouched at their original
//! position. Only a backup import drops them.

use crate::error::{RepositoryError, StorageError};
use crate::kv::{read_json, SharedStore};
use crate::scope::UserScope;
use crate::DATA_KEY;
use chrono::{DateTime, Duration, Utc};
use roadmap_model::{validate_transition, GenerationState, RoadmapDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use ulid::Ulid;

/// Aggregates over the current user's collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStats {
    /// Number of stored roadmaps
    pub roadmap_count: usize,
    /// Roadmaps in `completed` state
    pub completed_roadmaps: usize,
    /// Roadmaps in `in-progress` state
    pub in_progress_roadmaps: usize,
    /// Encoded size of the collection in bytes
    pub storage_size: usize,
    /// Most recent `updatedAt`
    pub last_updated: Option<DateTime<Utc>>,
}

/// CRUD over the current user's roadmap documents
#[derive(Debug)]
pub struct RoadmapRepository {
    store: SharedStore,
    scope: Arc<UserScope>,
}

impl RoadmapRepository {
    /// Create repository scoped to `scope`
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore, scope: Arc<UserScope>) -> Self {
        Self { store, scope }
    }

    /// The scope this repository reads and writes under
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &Arc<UserScope> {
        &self.scope
    }

    /// Underlying medium
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Current user's documents in stored order
    ///
    /// Empty if nothing is stored or the record is corrupt. Entries that
    /// cannot be read are skipped.
    #[must_use]
    pub fn get_all(&self) -> Vec<RoadmapDocument> {
        let user_id = self.scope.user_id();
        let record = self.load_record();
        decode_slot(&record, &user_id).docs
    }

    /// Look up by id or sanitized name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<RoadmapDocument> {
        self.get_all().into_iter().find(|d| d.is_identified_by(key))
    }

    /// Insert or replace a document
    ///
    /// Assigns `id` and `sanitizedName` when missing, keeps `createdAt`
    /// from the first save, refreshes `updatedAt` and stamps the owning
    /// user id. Returns the document as stored.
    ///
    /// # Errors
    /// `StorageError` if the collection cannot be written; nothing is
    /// silently dropped.
    pub fn save(&self, doc: RoadmapDocument) -> Result<RoadmapDocument, StorageError> {
        let user_id = self.scope.user_id();
        let mut record = self.load_record();
        let mut slot = decode_slot(&record, &user_id);

        let saved = upsert(&mut slot.docs, doc, &user_id, Utc::now());
        self.write_slot(&mut record, &user_id, &slot)
            .inspect_err(|e| tracing::error!(id = %saved.id, error = %e, "Failed to save roadmap"))?;

        tracing::debug!(id = %saved.id, user_id = %user_id, count = slot.docs.len(), "Saved roadmap");
        Ok(saved)
    }

    /// Remove the first document identified by `key`
    ///
    /// Returns whether a document was removed. Storage failures are logged
    /// and reported as `false`.
    pub fn delete(&self, key: &str) -> bool {
        let user_id = self.scope.user_id();
        let mut record = self.load_record();
        let mut slot = decode_slot(&record, &user_id);

        let Some(index) = slot.docs.iter().position(|d| d.is_identified_by(key)) else {
            return false;
        };
        let removed = slot.docs.remove(index);

        match self.write_slot(&mut record, &user_id, &slot) {
            Ok(()) => {
                tracing::debug!(id = %removed.id, user_id = %user_id, "Deleted roadmap");
                true
            }
            Err(e) => {
                tracing::error!(id = %removed.id, error = %e, "Failed to delete roadmap");
                false
            }
        }
    }

    /// Change a document's generation state and save it
    ///
    /// Returns `Ok(None)` if no document matches `key`.
    ///
    /// # Errors
    /// - `RepositoryError::Transition` if the change is not allowed
    /// - `RepositoryError::Storage` if saving fails
    pub fn transition(
        &self,
        key: &str,
        state: GenerationState,
    ) -> Result<Option<RoadmapDocument>, RepositoryError> {
        let Some(mut doc) = self.get(key) else {
            return Ok(None);
        };
        validate_transition(doc.generation_state, state)?;
        doc.generation_state = state;
        Ok(Some(self.save(doc)?))
    }

    /// Aggregate counts over the current collection
    #[must_use]
    pub fn get_stats(&self) -> RepositoryStats {
        let docs = self.get_all();
        let storage_size = serde_json::to_string(&docs).map_or(0, |s| s.len());
        RepositoryStats {
            roadmap_count: docs.len(),
            completed_roadmaps: count_state(&docs, GenerationState::Completed),
            in_progress_roadmaps: count_state(&docs, GenerationState::InProgress),
            storage_size,
            last_updated: docs.iter().filter_map(|d| d.updated_at).max(),
        }
    }

    /// Remove the current user's collection
    ///
    /// # Errors
    /// Returns error if the record cannot be written
    pub fn clear(&self) -> Result<(), StorageError> {
        let user_id = self.scope.user_id();
        let mut record = self.load_record();
        if record.remove(&user_id).is_none() {
            return Ok(());
        }
        self.write_record(&record)?;
        tracing::info!(user_id = %user_id, "Cleared roadmap collection");
        Ok(())
    }

    /// Wipe the current user's collection and forget the user id
    ///
    /// # Errors
    /// Returns error if either removal fails
    pub fn reset(&self) -> Result<(), StorageError> {
        self.clear()?;
        self.scope.forget()?;
        tracing::info!("Reset user scope");
        Ok(())
    }

    /// Replace the whole collection in one write; returns the stored count
    ///
    /// Unreadable entries of the old collection are dropped too.
    pub(crate) fn replace_all(&self, docs: Vec<RoadmapDocument>) -> Result<usize, StorageError> {
        let user_id = self.scope.user_id();
        let mut record = self.load_record();
        let now = Utc::now();

        let mut slot = Slot::default();
        for doc in docs {
            upsert(&mut slot.docs, doc, &user_id, now);
        }
        self.write_slot(&mut record, &user_id, &slot)?;
        Ok(slot.docs.len())
    }

    fn load_record(&self) -> Map<String, Value> {
        read_json(self.store.as_ref(), DATA_KEY).unwrap_or_default()
    }

    fn write_slot(
        &self,
        record: &mut Map<String, Value>,
        user_id: &str,
        slot: &Slot,
    ) -> Result<(), StorageError> {
        let encoded = slot.encode().map_err(|source| StorageError::Encode {
            key: DATA_KEY.to_string(),
            source,
        })?;
        record.insert(user_id.to_string(), encoded);
        self.write_record(record)
    }

    fn write_record(&self, record: &Map<String, Value>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record).map_err(|source| StorageError::Encode {
            key: DATA_KEY.to_string(),
            source,
        })?;
        self.store.set(DATA_KEY, &raw)
    }
}

/// One user's collection as read from the record
#[derive(Debug, Default)]
struct Slot {
    docs: Vec<RoadmapDocument>,
    /// Entries that failed to decode, with their position in the stored list
    unreadable: Vec<(usize, Value)>,
}

impl Slot {
    fn encode(&self) -> Result<Value, serde_json::Error> {
        let mut entries = self
            .docs
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        for (index, raw) in &self.unreadable {
            let at = (*index).min(entries.len());
            entries.insert(at, raw.clone());
        }
        Ok(Value::Array(entries))
    }
}

fn decode_slot(record: &Map<String, Value>, user_id: &str) -> Slot {
    let Some(value) = record.get(user_id) else {
        return Slot::default();
    };
    let Some(entries) = value.as_array() else {
        tracing::warn!(user_id, "Roadmap collection is not a list, treating as empty");
        return Slot::default();
    };

    let mut slot = Slot::default();
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value(entry.clone()) {
            Ok(doc) => slot.docs.push(doc),
            Err(e) => {
                tracing::warn!(user_id, index, error = %e, "Skipping unreadable roadmap");
                slot.unreadable.push((index, entry.clone()));
            }
        }
    }
    slot
}

/// Stamp `doc` and merge it into `docs`; returns the stored copy
fn upsert(
    docs: &mut Vec<RoadmapDocument>,
    mut doc: RoadmapDocument,
    user_id: &str,
    now: DateTime<Utc>,
) -> RoadmapDocument {
    if doc.id.is_empty() {
        doc.id = Ulid::new().to_string();
    }
    if doc.sanitized_name.is_empty() {
        doc.sanitized_name = doc.id.clone();
    }
    doc.user_id = user_id.to_string();

    let existing = docs.iter().position(|d| doc.same_identity(d));
    let previous = existing.map(|i| &docs[i]);

    if doc.created_at.is_none() {
        doc.created_at = previous.and_then(|p| p.created_at).or(Some(now));
    }
    let last_update = previous.and_then(|p| p.updated_at);
    doc.updated_at = Some(match last_update {
        Some(last) if last >= now => last + Duration::microseconds(1),
        _ => now,
    });

    match existing {
        Some(index) => {
            docs[index] = doc.clone();
            // a save matching one entry by id and another by name collapses both
            let mut position = 0;
            docs.retain(|d| {
                let keep = position == index || !doc.same_identity(d);
                position += 1;
                keep
            });
        }
        None => docs.push(doc.clone()),
    }
    doc
}

fn count_state(docs: &[RoadmapDocument], state: GenerationState) -> usize {
    docs.iter().filter(|d| d.generation_state == state).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KeyValueStore, MemoryStore};
    use pretty_assertions::assert_eq;

    fn repo() -> (Arc<MemoryStore>, RoadmapRepository) {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let scope = Arc::new(UserScope::new(shared.clone()));
        (store, RoadmapRepository::new(shared, scope))
    }

    #[test]
    fn save_assigns_identity_and_timestamps() {
        let (_, repo) = repo();
        let saved = repo
            .save(RoadmapDocument::new("Rust", "learn rust", "ship a crate"))
            .unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(saved.sanitized_name, saved.id);
        assert_eq!(saved.user_id, repo.scope().user_id());
        assert!(saved.created_at.is_some());
        assert!(saved.updated_at >= saved.created_at);
    }

    #[test]
    fn save_replaces_in_place_and_keeps_created_at() {
        let (_, repo) = repo();
        let a = repo.save(RoadmapDocument::new("A", "x", "y").with_id("a")).unwrap();
        repo.save(RoadmapDocument::new("B", "x", "y").with_id("b")).unwrap();

        let mut edited = RoadmapDocument::new("A2", "x2", "y2").with_id("a");
        edited.created_at = None;
        let second = repo.save(edited).unwrap();

        let all = repo.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].title, "A2");
        assert_eq!(second.created_at, a.created_at);
        assert!(second.updated_at > a.updated_at);
    }

    #[test]
    fn save_matches_on_sanitized_name() {
        let (_, repo) = repo();
        repo.save(RoadmapDocument::new("A", "x", "y").with_id("a").with_sanitized_name("learn-a"))
            .unwrap();
        let saved = repo
            .save(RoadmapDocument::new("A'", "x", "y").with_sanitized_name("learn-a"))
            .unwrap();

        let all = repo.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "A'");
        assert_eq!(all[0].id, saved.id);
    }

    #[test]
    fn colliding_save_collapses_two_entries() {
        let (_, repo) = repo();
        repo.save(RoadmapDocument::new("A", "", "").with_id("a").with_sanitized_name("na"))
            .unwrap();
        repo.save(RoadmapDocument::new("B", "", "").with_id("b").with_sanitized_name("nb"))
            .unwrap();

        // id of the first, sanitized name of the second
        repo.save(RoadmapDocument::new("C", "", "").with_id("a").with_sanitized_name("nb"))
            .unwrap();

        let all = repo.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "C");
    }

    #[test]
    fn forged_user_id_is_overwritten() {
        let (_, repo) = repo();
        let mut doc = RoadmapDocument::new("A", "x", "y");
        doc.user_id = "someone-else".to_string();
        let saved = repo.save(doc).unwrap();
        assert_eq!(saved.user_id, repo.scope().user_id());
    }

    #[test]
    fn delete_reports_removal() {
        let (_, repo) = repo();
        repo.save(RoadmapDocument::new("A", "x", "y").with_id("a")).unwrap();

        assert!(!repo.delete("missing"));
        assert_eq!(repo.get_all().len(), 1);

        assert!(repo.delete("a"));
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn corrupt_record_reads_as_empty() {
        let (store, repo) = repo();
        store.set(DATA_KEY, "{{{{").unwrap();
        assert!(repo.get_all().is_empty());
        assert!(!repo.delete("a"));
        assert_eq!(repo.get_stats().roadmap_count, 0);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let (store, repo) = repo();
        let user = repo.scope().user_id();
        let mut record = Map::new();
        record.insert(user, serde_json::json!([{ "id": "ok", "title": "fine" }, 42]));
        store.set(DATA_KEY, &Value::Object(record).to_string()).unwrap();

        let all = repo.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "ok");
    }

    #[test]
    fn unreadable_entries_survive_writes() {
        let (store, repo) = repo();
        let user = repo.scope().user_id();
        let legacy = serde_json::json!({ "id": "legacy", "generationState": "generating" });
        let mut record = Map::new();
        record.insert(
            user.clone(),
            serde_json::json!([legacy.clone(), { "id": "kept", "title": "K" }]),
        );
        store.set(DATA_KEY, &Value::Object(record).to_string()).unwrap();

        repo.save(RoadmapDocument::new("New", "x", "y").with_id("new")).unwrap();
        assert!(repo.delete("kept"));

        let raw: Value = serde_json::from_str(&store.get(DATA_KEY).unwrap()).unwrap();
        assert_eq!(raw[&user][0], legacy);
        assert_eq!(raw[&user][1]["id"], "new");
        assert_eq!(raw[&user].as_array().map(Vec::len), Some(2));

        let ids: Vec<_> = repo.get_all().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["new"]);
    }

    #[test]
    fn replace_all_drops_unreadable_entries() {
        let (store, repo) = repo();
        let user = repo.scope().user_id();
        let mut record = Map::new();
        record.insert(user.clone(), serde_json::json!([{ "id": "legacy", "generationState": "generating" }]));
        store.set(DATA_KEY, &Value::Object(record).to_string()).unwrap();

        let count = repo
            .replace_all(vec![RoadmapDocument::new("A", "x", "y").with_id("a")])
            .unwrap();
        assert_eq!(count, 1);

        let raw: Value = serde_json::from_str(&store.get(DATA_KEY).unwrap()).unwrap();
        assert_eq!(raw[&user].as_array().map(Vec::len), Some(1));
        assert_eq!(raw[&user][0]["id"], "a");
    }

    #[test]
    fn other_users_are_invisible_and_untouched() {
        let (store, repo) = repo();
        let record = serde_json::json!({ "user_other": [{ "id": "theirs", "title": "T" }] });
        store.set(DATA_KEY, &record.to_string()).unwrap();

        assert!(repo.get_all().is_empty());
        assert!(!repo.delete("theirs"));
        repo.save(RoadmapDocument::new("Mine", "x", "y")).unwrap();
        repo.clear().unwrap();

        let raw: Value = serde_json::from_str(&store.get(DATA_KEY).unwrap()).unwrap();
        assert_eq!(raw["user_other"][0]["id"], "theirs");
    }

    #[test]
    fn transition_validates_state_changes() {
        let (_, repo) = repo();
        repo.save(RoadmapDocument::new("A", "x", "y").with_id("a")).unwrap();

        let doc = repo.transition("a", GenerationState::InProgress).unwrap().unwrap();
        assert_eq!(doc.generation_state, GenerationState::InProgress);

        let err = repo.transition("a", GenerationState::Queued).unwrap_err();
        assert!(matches!(err, RepositoryError::Transition(_)));

        assert!(repo.transition("nope", GenerationState::Paused).unwrap().is_none());
    }

    #[test]
    fn stats_aggregate_states() {
        let (_, repo) = repo();
        let mut done = RoadmapDocument::new("A", "x", "y");
        done.generation_state = GenerationState::Completed;
        let mut running = RoadmapDocument::new("B", "x", "y");
        running.generation_state = GenerationState::InProgress;
        repo.save(done).unwrap();
        let last = repo.save(running).unwrap();
        repo.save(RoadmapDocument::new("C", "x", "y")).unwrap();

        let stats = repo.get_stats();
        assert_eq!(stats.roadmap_count, 3);
        assert_eq!(stats.completed_roadmaps, 1);
        assert_eq!(stats.in_progress_roadmaps, 1);
        assert!(stats.storage_size > 0);
        assert!(stats.last_updated >= last.updated_at);
    }

    #[test]
    fn reset_wipes_collection_and_user() {
        let (_, repo) = repo();
        let before = repo.scope().user_id();
        repo.save(RoadmapDocument::new("A", "x", "y")).unwrap();

        repo.reset().unwrap();
        assert_ne!(repo.scope().user_id(), before);
        assert!(repo.get_all().is_empty());
    }
}
