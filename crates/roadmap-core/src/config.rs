//! Planner configuration
//!
//! ```toml
//! data_file = "roadmaps.json"
//! log_level = "info"
//!
//! [phase]
//! max_items_per_phase = 5
//! preferred_difficulty = 2
//! time_constraint = 40.0
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 1000
//! max_delay_ms = 10000
//! backoff_factor = 2.0
//! jitter = true
//!
//! [breaker]
//! failure_threshold = 5
//! reset_timeout_ms = 60000
//! ```
//!
//! Every key is optional.

use crate::error::ConfigError;
use roadmap_phases::PhaseOptions;
use roadmap_resilience::{BreakerOptions, RetryOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Phase grouping
    pub phase: PhaseOptions,
    /// Generation retries
    pub retry: RetryOptions,
    /// Generation circuit breaker
    pub breaker: BreakerOptions,
    /// JSON file backing the store; in-memory when unset
    pub data_file: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl PlannerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError` if the file is unreadable, malformed or out of range
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// `ConfigError` if the text is malformed or out of range
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planner cannot work with
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phase.max_items_per_phase == 0 {
            return Err(ConfigError::invalid("phase.max_items_per_phase", "must be at least 1"));
        }
        if let Some(limit) = self.phase.time_constraint {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(ConfigError::invalid(
                    "phase.time_constraint",
                    format!("must be a positive number, got {limit}"),
                ));
            }
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::invalid(
                "retry.backoff_factor",
                format!("must be at least 1, got {}", self.retry.backoff_factor),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::invalid(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::invalid("breaker.failure_threshold", "must be at least 1"));
        }
        Ok(())
    }

    /// With phase options
    #[inline]
    #[must_use]
    pub fn with_phase(mut self, phase: PhaseOptions) -> Self {
        self.phase = phase;
        self
    }

    /// With retry options
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    /// With breaker options
    #[inline]
    #[must_use]
    pub fn with_breaker(mut self, breaker: BreakerOptions) -> Self {
        self.breaker = breaker;
        self
    }

    /// With backing data file
    #[inline]
    #[must_use]
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// With default log filter
    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            phase: PhaseOptions::default(),
            retry: RetryOptions::default(),
            breaker: BreakerOptions::default(),
            data_file: None,
            log_level: "info".to_string(),
        }
    }
}
