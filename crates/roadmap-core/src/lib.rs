//! Roadmap Core
//!
//! Wires the lower crates into one explicitly constructed service:
//! - [`PlannerConfig`]: phase, retry and breaker tuning, loadable from TOML
//! - [`RoadmapGenerator`]: the external generation service seam
//! - [`RoadmapPlanner`]: owns the repository, backup codec, phase generator,
//!   retry policy and circuit breaker, with explicit `init`/`dispose`
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_core::{GenerationRequest, PlannerConfig, RoadmapPlanner};
//! use roadmap_resilience::AbortSignal;
//! use roadmap_store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example(generator: Arc<dyn roadmap_core::RoadmapGenerator>) -> Result<(), roadmap_core::PlannerError> {
//! let planner = RoadmapPlanner::new(PlannerConfig::new(), Arc::new(MemoryStore::new()), generator);
//! planner.init()?;
//!
//! let request = GenerationRequest::new("Rust", "learn rust", "ship a crate");
//! let roadmap = planner.plan(request, &AbortSignal::new()).await?;
//! println!("{} phases", roadmap.phases.len());
//!
//! planner.dispose();
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod generator;
pub mod planner;

pub use config::PlannerConfig;
pub use error::{ConfigError, GenerationError, PlannerError};
pub use generator::{GenerationRequest, RoadmapGenerator};
pub use planner::RoadmapPlanner;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a planner
    pub use crate::{
        GenerationError, GenerationRequest, PlannerConfig, PlannerError, RoadmapGenerator,
        RoadmapPlanner,
    };
    pub use roadmap_model::prelude::*;
    pub use roadmap_resilience::AbortSignal;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
