//! Generation service seam
//!
//! The planner never talks to an AI provider directly; outer layers plug a
//! [`RoadmapGenerator`] in at construction.

use crate::error::GenerationError;
use async_trait::async_trait;
use roadmap_model::LearningItem;
use serde::{Deserialize, Serialize};

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Roadmap title
    pub title: String,
    /// Learning objective
    pub objective: String,
    /// What the learner should be able to do at the end
    pub final_goal: String,
    /// Free-form constraints passed through to the service
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl GenerationRequest {
    /// Create request
    #[inline]
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
            constraints: Vec::new(),
        }
    }

    /// With an extra constraint
    #[inline]
    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }
}

/// External service turning a request into a flat item list
///
/// Calls may be repeated by the planner's retry policy, so implementations
/// should be safe to invoke more than once for the same request.
#[async_trait]
pub trait RoadmapGenerator: Send + Sync {
    /// Generate learning items for `request`
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<LearningItem>, GenerationError>;
}
