//! Roadmap planner
//!
//! The composition root: one explicitly constructed instance owns the
//! user scope, repository, backup codec, phase generator, retry policy and
//! circuit breaker. Lifecycle is explicit; after [`RoadmapPlanner::dispose`]
//! every operation fails with [`PlannerError::Disposed`].
//!
//! # Generation flow
//!
//! ```text
//! plan(request)
//!   save queued -> in-progress
//!   retry( breaker( generator.generate ) )
//!     ok      -> group into phases -> completed
//!     aborted -> paused
//!     failed  -> error
//! ```

use crate::config::PlannerConfig;
use crate::error::{GenerationError, PlannerError};
use crate::generator::{GenerationRequest, RoadmapGenerator};
use roadmap_model::{validate_transition, GenerationState, LearningItem, RoadmapDocument};
use roadmap_phases::PhaseGenerator;
use roadmap_resilience::{AbortSignal, BreakerError, CircuitBreaker, RetryError, RetryPolicy};
use roadmap_store::{
    BackupCodec, FileStore, MemoryStore, RoadmapRepository, SharedStore, UserScope,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Roadmap planning service
pub struct RoadmapPlanner {
    config: PlannerConfig,
    repository: Arc<RoadmapRepository>,
    backup: BackupCodec,
    generator: Arc<dyn RoadmapGenerator>,
    phases: PhaseGenerator,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    disposed: AtomicBool,
}

impl std::fmt::Debug for RoadmapPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadmapPlanner")
            .field("config", &self.config)
            .field("breaker", &self.breaker.state())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl RoadmapPlanner {
    /// Create planner over `store`
    #[must_use]
    pub fn new(
        config: PlannerConfig,
        store: SharedStore,
        generator: Arc<dyn RoadmapGenerator>,
    ) -> Self {
        let scope = Arc::new(UserScope::new(store.clone()));
        let repository = Arc::new(RoadmapRepository::new(store, scope));
        Self {
            backup: BackupCodec::new(repository.clone()),
            repository,
            generator,
            phases: PhaseGenerator::new(config.phase),
            retry: RetryPolicy::new(config.retry),
            breaker: CircuitBreaker::new(config.breaker),
            disposed: AtomicBool::new(false),
            config,
        }
    }

    /// Create planner over the medium named by `config.data_file`
    ///
    /// A file store when a path is configured, in-memory otherwise.
    #[must_use]
    pub fn from_config(config: PlannerConfig, generator: Arc<dyn RoadmapGenerator>) -> Self {
        let store: SharedStore = match &config.data_file {
            Some(path) => Arc::new(FileStore::open(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::new(config, store, generator)
    }

    /// Resolve the user scope; returns the current user id
    ///
    /// # Errors
    /// `PlannerError::Disposed` after [`dispose`](Self::dispose)
    pub fn init(&self) -> Result<String, PlannerError> {
        self.ensure_open()?;
        let user_id = self.repository.scope().user_id();
        let roadmaps = self.repository.get_all().len();
        tracing::info!(user_id = %user_id, roadmaps, "Planner initialized");
        Ok(user_id)
    }

    /// Close the planner; idempotent
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            tracing::info!("Planner disposed");
        }
    }

    /// Whether [`dispose`](Self::dispose) was called
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Document store
    #[inline]
    #[must_use]
    pub fn repository(&self) -> &Arc<RoadmapRepository> {
        &self.repository
    }

    /// Backup export/import
    #[inline]
    #[must_use]
    pub fn backup(&self) -> &BackupCodec {
        &self.backup
    }

    /// Breaker guarding generation calls
    #[inline]
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Phase grouping in use
    #[inline]
    #[must_use]
    pub fn phase_generator(&self) -> &PhaseGenerator {
        &self.phases
    }

    /// Create a roadmap for `request` and generate its phases
    ///
    /// The document is saved before generation starts, so a failed or
    /// aborted run leaves it in the collection as `error` or `paused`.
    ///
    /// # Errors
    /// - `PlannerError::Aborted` if `signal` fired; the roadmap is paused
    /// - `PlannerError::Generation` / `BreakerOpen` if generation failed;
    ///   the roadmap is marked `error`
    /// - `PlannerError::Storage` if the document could not be saved
    pub async fn plan(
        &self,
        request: GenerationRequest,
        signal: &AbortSignal,
    ) -> Result<RoadmapDocument, PlannerError> {
        self.ensure_open()?;
        let doc = RoadmapDocument::new(
            request.title.clone(),
            request.objective.clone(),
            request.final_goal.clone(),
        )
        .with_constraints(request.constraints.iter().cloned());
        let queued = self.repository.save(doc)?;
        tracing::info!(id = %queued.id, title = %queued.title, "Queued roadmap");
        self.generate_into(&queued.id, &request, signal).await
    }

    /// Continue generation of a queued or paused roadmap
    ///
    /// The request is rebuilt from the stored title, objective, final goal
    /// and constraints.
    ///
    /// # Errors
    /// As [`plan`](Self::plan), plus `NotFound` for an unknown key and
    /// `Transition` if the roadmap cannot move to `in-progress`.
    pub async fn resume(
        &self,
        key: &str,
        signal: &AbortSignal,
    ) -> Result<RoadmapDocument, PlannerError> {
        self.ensure_open()?;
        let doc = self.find(key)?;
        validate_transition(doc.generation_state, GenerationState::InProgress)?;
        let mut request = GenerationRequest::new(doc.title, doc.objective, doc.final_goal);
        request.constraints = doc.constraints;
        self.generate_into(&doc.id, &request, signal).await
    }

    /// Mark a roadmap paused
    ///
    /// # Errors
    /// `NotFound`, `Transition` or `Storage`
    pub fn pause(&self, key: &str) -> Result<RoadmapDocument, PlannerError> {
        self.ensure_open()?;
        self.set_state(key, GenerationState::Paused)
    }

    /// Put a failed or completed roadmap back in the queue
    ///
    /// # Errors
    /// `NotFound`, `Transition` or `Storage`
    pub fn requeue(&self, key: &str) -> Result<RoadmapDocument, PlannerError> {
        self.ensure_open()?;
        self.set_state(key, GenerationState::Queued)
    }

    async fn generate_into(
        &self,
        id: &str,
        request: &GenerationRequest,
        signal: &AbortSignal,
    ) -> Result<RoadmapDocument, PlannerError> {
        self.set_state(id, GenerationState::InProgress)?;
        if signal.is_aborted() {
            return self.abort(id);
        }

        let outcome = self
            .retry
            .run_until(
                || self.breaker.execute(|| self.generator.generate(request)),
                signal,
                |e| e.inner().is_some_and(GenerationError::is_retryable),
            )
            .await;

        match outcome {
            Ok(items) => self.complete(id, &items),
            Err(RetryError::Aborted(error)) => {
                tracing::warn!(id, error = %error, "Generation aborted");
                self.abort(id)
            }
            Err(RetryError::Failed(error)) => {
                tracing::error!(id, error = %error, "Generation failed");
                if let Err(e) = self.set_state(id, GenerationState::Error) {
                    tracing::error!(id, error = %e, "Failed to mark roadmap as errored");
                }
                Err(match error {
                    BreakerError::Open { retry_in } => PlannerError::BreakerOpen { retry_in },
                    BreakerError::Inner(e) => PlannerError::Generation(e),
                })
            }
        }
    }

    fn complete(&self, id: &str, items: &[LearningItem]) -> Result<RoadmapDocument, PlannerError> {
        let phases = self.phases.generate(items);
        let mut doc = self.find(id)?;
        if doc.generation_state == GenerationState::Paused {
            // paused while the call was in flight; the result is dropped
            return Err(PlannerError::Aborted { id: doc.id });
        }
        validate_transition(doc.generation_state, GenerationState::Completed)?;
        doc.phases = phases;
        doc.generation_state = GenerationState::Completed;

        let saved = self.repository.save(doc)?;
        tracing::info!(
            id = %saved.id,
            items = items.len(),
            phases = saved.phases.len(),
            "Roadmap completed"
        );
        Ok(saved)
    }

    fn abort(&self, id: &str) -> Result<RoadmapDocument, PlannerError> {
        self.set_state(id, GenerationState::Paused)?;
        Err(PlannerError::Aborted { id: id.to_string() })
    }

    fn set_state(&self, key: &str, state: GenerationState) -> Result<RoadmapDocument, PlannerError> {
        self.repository
            .transition(key, state)?
            .ok_or_else(|| PlannerError::NotFound(key.to_string()))
    }

    fn find(&self, key: &str) -> Result<RoadmapDocument, PlannerError> {
        self.repository
            .get(key)
            .ok_or_else(|| PlannerError::NotFound(key.to_string()))
    }

    fn ensure_open(&self) -> Result<(), PlannerError> {
        if self.is_disposed() {
            return Err(PlannerError::Disposed);
        }
        Ok(())
    }
}
