//! Testing utilities for the roadmap workspace
//!
//! Shared fixtures and a scripted generation service.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roadmap_core::{
    GenerationError, GenerationRequest, PlannerConfig, RoadmapGenerator, RoadmapPlanner,
};
use roadmap_model::{LearningItem, RoadmapDocument};
use roadmap_resilience::RetryOptions;
use roadmap_store::{MemoryStore, SharedStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn item(title: &str, difficulty: i64, duration: f64) -> LearningItem {
    LearningItem::new(title)
        .with_difficulty(difficulty)
        .with_duration(duration)
}

/// A small Rust course spread over four difficulties
pub fn sample_items() -> Vec<LearningItem> {
    vec![
        item("Install the toolchain", 1, 1.0)
            .with_description("rustup cargo and editor setup")
            .with_objectives(["toolchain"]),
        item("Cargo project basics", 1, 2.0)
            .with_description("cargo build, cargo test")
            .with_objectives(["cargo"]),
        item("Ownership and borrowing", 2, 4.0)
            .with_description("ownership rules and borrowing")
            .with_objectives(["ownership", "borrowing"]),
        item("Structs and enums", 2, 3.0).with_objectives(["enums"]),
        item("Traits and generics", 3, 5.0)
            .with_description("generic code with traits")
            .with_objectives(["traits"]),
        item("Async with tokio", 4, 6.0)
            .with_description("async tasks on the tokio runtime")
            .with_objectives(["async"]),
    ]
}

pub fn sample_document(title: &str) -> RoadmapDocument {
    RoadmapDocument::new(title, format!("learn {title}"), format!("ship {title}"))
}

pub fn sample_request(title: &str) -> GenerationRequest {
    GenerationRequest::new(title, format!("learn {title}"), format!("ship {title}"))
}

pub fn memory_store() -> SharedStore {
    Arc::new(MemoryStore::new())
}

/// Defaults with jitter off, so paused-time tests see exact delays
pub fn test_config() -> PlannerConfig {
    PlannerConfig::new().with_retry(RetryOptions::default().with_jitter(false))
}

pub fn setup_test_planner(generator: Arc<ScriptedGenerator>) -> RoadmapPlanner {
    setup_test_planner_with(test_config(), memory_store(), generator)
}

pub fn setup_test_planner_with(
    config: PlannerConfig,
    store: SharedStore,
    generator: Arc<ScriptedGenerator>,
) -> RoadmapPlanner {
    RoadmapPlanner::new(config, store, generator)
}

/// Generation service replaying a fixed script
///
/// Each call pops the next scripted outcome; once the script runs out the
/// fallback items are returned.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<Vec<LearningItem>, GenerationError>>>,
    fallback: Vec<LearningItem>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Always succeeds with `items`
    pub fn succeeding(items: Vec<LearningItem>) -> Self {
        Self {
            fallback: items,
            ..Self::default()
        }
    }

    /// Fails with `errors` in order, then succeeds with `items`
    pub fn failing_then(errors: Vec<GenerationError>, items: Vec<LearningItem>) -> Self {
        Self {
            script: Mutex::new(errors.into_iter().map(Err).collect()),
            fallback: items,
            ..Self::default()
        }
    }

    /// Fails with `error` on every call
    pub fn always_failing(error: GenerationError) -> Self {
        Self::failing_then(vec![error; 64], Vec::new())
    }

    /// Each call sleeps `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RoadmapGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<LearningItem>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
