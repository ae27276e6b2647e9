//! Roadmap documents

use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Progress of a roadmap's generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationState {
    /// Saved, waiting for generation
    #[default]
    Queued,
    /// Generation running
    InProgress,
    /// Generation interrupted by the user
    Paused,
    /// Phases generated
    Completed,
    /// Generation failed
    Error,
}

impl GenerationState {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Queued => "queued",
            GenerationState::InProgress => "in-progress",
            GenerationState::Paused => "paused",
            GenerationState::Completed => "completed",
            GenerationState::Error => "error",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A user's saved learning plan
///
/// An empty `id` or `sanitized_name` means "not assigned yet"; the
/// repository fills both in on save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapDocument {
    /// Unique id within the owner's collection
    #[serde(default)]
    pub id: String,
    /// Secondary identity key, defaults to the id
    #[serde(default)]
    pub sanitized_name: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// What the user wants to learn
    #[serde(default)]
    pub objective: String,
    /// Where the user wants to end up
    #[serde(default)]
    pub final_goal: String,
    /// Constraints the roadmap was requested with (time, budget, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    /// Set on first save only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed on every save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Generation progress
    #[serde(default)]
    pub generation_state: GenerationState,
    /// Ordered phases
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Owning user scope, stamped on save
    #[serde(default)]
    pub user_id: String,
    /// Pinned by the user
    #[serde(default)]
    pub favorite: bool,
    /// Set when the document arrived through a backup import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
    /// Owner recorded in the imported backup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_user_id: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoadmapDocument {
    /// Create an unsaved document
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        objective: impl Into<String>,
        final_goal: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            objective: objective.into(),
            final_goal: final_goal.into(),
            ..Self::default()
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// With explicit sanitized name
    #[inline]
    #[must_use]
    pub fn with_sanitized_name(mut self, name: impl Into<String>) -> Self {
        self.sanitized_name = name.into();
        self
    }

    /// With request constraints
    #[must_use]
    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints = constraints.into_iter().map(Into::into).collect();
        self
    }

    /// With phases
    #[inline]
    #[must_use]
    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    /// Mark as favorite
    #[inline]
    #[must_use]
    pub fn favorite(mut self) -> Self {
        self.favorite = true;
        self
    }

    /// Whether `key` names this document by id or sanitized name
    #[must_use]
    pub fn is_identified_by(&self, key: &str) -> bool {
        !key.is_empty() && (self.id == key || self.sanitized_name == key)
    }

    /// Whether two documents share an identity key
    #[must_use]
    pub fn same_identity(&self, other: &RoadmapDocument) -> bool {
        other.is_identified_by(&self.id) || other.is_identified_by(&self.sanitized_name)
    }

    /// Total number of items across phases
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.phases.iter().map(Phase::len).sum()
    }

    /// Total estimated duration across phases
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.phases.iter().map(Phase::estimated_duration).sum()
    }
}

/// Favorites first, then most recently updated
pub fn sort_for_display(docs: &mut [RoadmapDocument]) {
    docs.sort_by(|a, b| match (a.favorite, b.favorite) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.updated_at.cmp(&a.updated_at),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn wire_format_uses_camel_case() {
        let doc = RoadmapDocument::new("Rust", "learn rust", "ship a crate").with_id("r1");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["finalGoal"], "ship a crate");
        assert_eq!(value["sanitizedName"], "");
        assert_eq!(value["generationState"], "queued");
        assert!(value.get("createdAt").is_none());
        assert!(value.get("constraints").is_none());
    }

    #[test]
    fn constraints_round_trip() {
        let doc = RoadmapDocument::new("Rust", "o", "g").with_constraints(["2h per week"]);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["constraints"], json!(["2h per week"]));

        let back: RoadmapDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back.constraints, ["2h per week"]);
        assert!(!back.extra.contains_key("constraints"));
    }

    #[test]
    fn generation_state_wire_names() {
        let value = serde_json::to_value(GenerationState::InProgress).unwrap();
        assert_eq!(value, "in-progress");
        let state: GenerationState = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(state, GenerationState::Paused);
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let raw = json!({
            "id": "r1",
            "title": "Go",
            "timeline": "3 months",
            "generationState": "completed"
        });
        let doc: RoadmapDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.generation_state, GenerationState::Completed);
        assert_eq!(doc.extra["timeline"], "3 months");

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["timeline"], "3 months");
    }

    #[test]
    fn identity_matches_id_or_sanitized_name() {
        let doc = RoadmapDocument::default()
            .with_id("abc")
            .with_sanitized_name("learn-rust");
        assert!(doc.is_identified_by("abc"));
        assert!(doc.is_identified_by("learn-rust"));
        assert!(!doc.is_identified_by(""));

        let other = RoadmapDocument::default().with_sanitized_name("learn-rust");
        assert!(doc.same_identity(&other));
    }

    #[test]
    fn display_order_favorites_then_recency() {
        let at = |h| Some(Utc.with_ymd_and_hms(2026, 1, 1, h, 0, 0).unwrap());
        let mut docs = vec![
            RoadmapDocument { id: "old".into(), updated_at: at(1), ..Default::default() },
            RoadmapDocument { id: "new".into(), updated_at: at(5), ..Default::default() },
            RoadmapDocument { id: "fav".into(), updated_at: at(0), favorite: true, ..Default::default() },
        ];
        sort_for_display(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["fav", "new", "old"]);
    }
}
