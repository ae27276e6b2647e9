//! Phase generation
//!
//! Turns the flat item list returned by a generation service into ordered
//! [`Phase`](roadmap_model::Phase)s:
//!
//! 1. Bucket items by exact difficulty, ascending.
//! 2. Classify each bucket against the preferred difficulty.
//! 3. Split buckets into phases by item count and optional time budget.
//! 4. Title each phase from repeated keywords and rank its objectives.
//! 5. With a time budget, merge adjacent phases that still fit.
//!
//! Every input item lands in exactly one phase, in its original relative
//! order within its difficulty bucket.
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_phases::{PhaseGenerator, PhaseOptions};
//!
//! let generator = PhaseGenerator::new(PhaseOptions::default().with_time_constraint(10.0));
//! let phases = generator.generate(&items);
//! ```

#![warn(unreachable_pub)]

pub mod generator;
pub mod heuristics;
pub mod options;

pub use generator::{classify_bucket, PhaseGenerator, ADVANCED_DIFFICULTY};
pub use heuristics::{common_keywords, phase_title, rank_objectives};
pub use options::PhaseOptions;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
