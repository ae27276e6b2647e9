//! Roadmap data model
//!
//! Defines the documents the planner stores and displays:
//! - [`LearningItem`]: an atomic unit of learning content
//! - [`Phase`]: an ordered group of items sharing a difficulty bucket
//! - [`RoadmapDocument`]: a user's saved learning plan
//! - [`GenerationState`] and its transition table
//!
//! All types serialize to the camelCase JSON layout shared with the web
//! client, and unknown fields are carried through untouched.

#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod item;
pub mod phase;
pub mod state;

pub use document::{sort_for_display, GenerationState, RoadmapDocument};
pub use error::TransitionError;
pub use item::{LearningItem, DEFAULT_DIFFICULTY};
pub use phase::{mean_difficulty, round_half_up, Phase, PhaseType};
pub use state::{allowed_transitions, validate_transition};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with roadmap documents
    pub use crate::{GenerationState, LearningItem, Phase, PhaseType, RoadmapDocument};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
