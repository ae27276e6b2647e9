//! Phases
//!
//! A [`Phase`] owns its items. `difficulty` and `estimated_duration` are
//! derived from them and recomputed on every edit, including when a phase
//! is read back from storage.

use crate::item::LearningItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Phase classification, derived from a difficulty bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    /// Below the preferred difficulty
    Foundation,
    /// At the preferred difficulty
    Core,
    /// Advanced material
    Advanced,
    /// Narrow specialization
    Specialization,
    /// Hands-on practice
    Practical,
    /// Everything above that is not advanced
    Mastery,
}

impl PhaseType {
    /// Human-readable label used in phase titles
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PhaseType::Foundation => "Foundation",
            PhaseType::Core => "Core",
            PhaseType::Advanced => "Advanced",
            PhaseType::Specialization => "Specialization",
            PhaseType::Practical => "Practical",
            PhaseType::Mastery => "Mastery",
        }
    }
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// An ordered group of learning items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PhaseRecord")]
pub struct Phase {
    id: String,
    title: String,
    #[serde(rename = "type")]
    phase_type: PhaseType,
    difficulty: i64,
    items: Vec<LearningItem>,
    estimated_duration: f64,
    objectives: Vec<String>,
}

impl Phase {
    /// Create a phase over `items` with a fresh id
    ///
    /// The title defaults to `"<Type> Phase <difficulty>"` and objectives to
    /// the items' objectives in first-seen order.
    #[must_use]
    pub fn new(phase_type: PhaseType, items: Vec<LearningItem>) -> Self {
        let mut phase = Self {
            id: Ulid::new().to_string(),
            title: String::new(),
            phase_type,
            difficulty: 0,
            items,
            estimated_duration: 0.0,
            objectives: Vec::new(),
        };
        phase.recompute();
        phase.title = phase.fallback_title();
        phase.objectives = collect_objectives(&phase.items);
        phase
    }

    /// Phase id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Descriptive title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Phase classification
    #[inline]
    #[must_use]
    pub fn phase_type(&self) -> PhaseType {
        self.phase_type
    }

    /// Rounded mean of the items' difficulties
    #[inline]
    #[must_use]
    pub fn difficulty(&self) -> i64 {
        self.difficulty
    }

    /// Items in order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[LearningItem] {
        &self.items
    }

    /// Sum of the items' durations
    #[inline]
    #[must_use]
    pub fn estimated_duration(&self) -> f64 {
        self.estimated_duration
    }

    /// Covered skills, most referenced first
    #[inline]
    #[must_use]
    pub fn objectives(&self) -> &[String] {
        &self.objectives
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the phase has no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `"<Type> Phase <difficulty>"`
    #[must_use]
    pub fn fallback_title(&self) -> String {
        format!("{} Phase {}", self.phase_type.label(), self.difficulty)
    }

    /// Replace the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replace the objectives
    pub fn set_objectives(&mut self, objectives: Vec<String>) {
        self.objectives = objectives;
    }

    /// Append an item
    pub fn push_item(&mut self, item: LearningItem) {
        self.items.push(item);
        self.recompute();
    }

    /// Remove the item at `index`, if any
    pub fn remove_item(&mut self, index: usize) -> Option<LearningItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.recompute();
        Some(removed)
    }

    /// Replace all items
    pub fn set_items(&mut self, items: Vec<LearningItem>) {
        self.items = items;
        self.recompute();
    }

    /// Move all of `other`'s items to the end of this phase
    pub fn absorb(&mut self, other: Phase) {
        self.items.extend(other.items);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.difficulty = mean_difficulty(&self.items);
        self.estimated_duration = self.items.iter().map(|i| i.duration).sum();
    }
}

/// Round half up: `floor(x + 0.5)`
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Rounded mean difficulty; `0` for no items
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_difficulty(items: &[LearningItem]) -> i64 {
    if items.is_empty() {
        return 0;
    }
    // i128 so extreme difficulties cannot overflow the sum
    let total: i128 = items.iter().map(|i| i128::from(i.difficulty)).sum();
    round_half_up(total as f64 / items.len() as f64)
}

fn collect_objectives(items: &[LearningItem]) -> Vec<String> {
    let mut seen = Vec::new();
    for objective in items.iter().flat_map(|i| i.objectives.iter()) {
        if !seen.contains(objective) {
            seen.push(objective.clone());
        }
    }
    seen
}

/// Wire shape; derived numbers are recomputed on the way in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default = "default_phase_type")]
    phase_type: PhaseType,
    #[serde(default)]
    items: Vec<LearningItem>,
    #[serde(default)]
    objectives: Vec<String>,
}

fn default_phase_type() -> PhaseType {
    PhaseType::Core
}

impl From<PhaseRecord> for Phase {
    fn from(record: PhaseRecord) -> Self {
        let mut phase = Phase {
            id: if record.id.is_empty() {
                Ulid::new().to_string()
            } else {
                record.id
            },
            title: record.title,
            phase_type: record.phase_type,
            difficulty: 0,
            items: record.items,
            estimated_duration: 0.0,
            objectives: record.objectives,
        };
        phase.recompute();
        if phase.title.is_empty() {
            phase.title = phase.fallback_title();
        }
        phase
    }
}
