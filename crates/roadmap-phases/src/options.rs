//! Phase generation options

use serde::{Deserialize, Serialize};

/// Options for [`PhaseGenerator`](crate::PhaseGenerator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseOptions {
    /// Items per phase before a new phase starts
    pub max_items_per_phase: usize,
    /// Difficulty treated as "core"
    pub preferred_difficulty: i64,
    /// Optional duration cap per phase, in the items' unit
    pub time_constraint: Option<f64>,
}

impl PhaseOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max items per phase
    #[inline]
    #[must_use]
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items_per_phase = max;
        self
    }

    /// With preferred difficulty
    #[inline]
    #[must_use]
    pub fn with_preferred_difficulty(mut self, difficulty: i64) -> Self {
        self.preferred_difficulty = difficulty;
        self
    }

    /// With per-phase duration cap
    #[inline]
    #[must_use]
    pub fn with_time_constraint(mut self, limit: f64) -> Self {
        self.time_constraint = Some(limit);
        self
    }
}

impl Default for PhaseOptions {
    fn default() -> Self {
        Self {
            max_items_per_phase: 5,
            preferred_difficulty: 2,
            time_constraint: None,
        }
    }
}
