//! Learning items
//!
//! Items arrive from an external generation service, so numeric fields are
//! read leniently: a missing, null or unparseable `difficulty` becomes
//! [`DEFAULT_DIFFICULTY`] and a bad `duration` becomes `0`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Difficulty assumed when an item does not carry one (beginner)
pub const DEFAULT_DIFFICULTY: i64 = 1;

/// An atomic unit of learning content (a mini-goal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    /// Short title
    #[serde(default)]
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Difficulty, 1 (beginner) to 4 (expert)
    #[serde(default = "default_difficulty", deserialize_with = "lenient_difficulty")]
    pub difficulty: i64,
    /// Duration, in the caller's unit (usually hours)
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: f64,
    /// Skills this item covers
    #[serde(default, deserialize_with = "lenient_objectives")]
    pub objectives: Vec<String>,
    /// Fields this crate does not interpret (resources, links, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LearningItem {
    /// Create item with a title
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With difficulty
    #[inline]
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: i64) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// With duration
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// With covered objectives
    #[must_use]
    pub fn with_objectives<I, S>(mut self, objectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objectives = objectives.into_iter().map(Into::into).collect();
        self
    }

    /// Title and description joined, as used by the keyword heuristics
    #[must_use]
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

impl Default for LearningItem {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            difficulty: DEFAULT_DIFFICULTY,
            duration: 0.0,
            objectives: Vec::new(),
            extra: Map::new(),
        }
    }
}

fn default_difficulty() -> i64 {
    DEFAULT_DIFFICULTY
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_difficulty<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(parsed.unwrap_or(DEFAULT_DIFFICULTY))
}

fn lenient_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|f| f.is_finite()).unwrap_or(0.0))
}

fn lenient_objectives<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
