//! Circuit breaker
//!
//! ```text
//! Closed --(failure_threshold consecutive failures)--> Open
//! Open   --(reset_timeout elapsed, next call)-------> HalfOpen
//! HalfOpen --(trial succeeds)--> Closed
//! HalfOpen --(trial fails)-----> Open
//! ```
//!
//! While open and before the timeout, calls are rejected without running.
//! Half-open admits a single trial; calls arriving while it runs are
//! rejected too. A trial whose future is dropped stops blocking others once
//! another reset timeout has passed.

use crate::error::BreakerError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Stand-in for a reset timeout too large to add to an instant
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Breaker tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerOptions {
    /// Consecutive failures that open the breaker
    pub failure_threshold: u32,
    /// How long the breaker stays open, in milliseconds
    pub reset_timeout_ms: u64,
}

impl BreakerOptions {
    /// With failure threshold
    #[inline]
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// With open duration
    #[inline]
    #[must_use]
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Open duration
    #[inline]
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 60_000,
        }
    }
}

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    /// Calls pass through
    Closed,
    /// Calls are rejected
    Open,
    /// Next call is a trial
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        };
        f.pad(s)
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failure_count: u32,
    open_until: Option<Instant>,
    trial_started: Option<Instant>,
}

/// Fails fast after repeated consecutive failures
#[derive(Debug)]
pub struct CircuitBreaker {
    options: BreakerOptions,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker
    #[must_use]
    pub fn new(options: BreakerOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failure_count: 0,
                open_until: None,
                trial_started: None,
            }),
        }
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BreakerOptions {
        &self.options
    }

    /// Current state
    ///
    /// An open breaker whose timeout has passed still reports `Open` until
    /// the next call moves it to `HalfOpen`.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Consecutive failures so far
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Force the breaker closed
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        inner.open_until = None;
        inner.trial_started = None;
    }

    /// Run `operation` unless the breaker is open
    ///
    /// # Errors
    /// [`BreakerError::Open`] without invoking `operation` while open,
    /// [`BreakerError::Inner`] with the operation's own error otherwise.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit()?;
        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                Err(BreakerError::Inner(error))
            }
        }
    }

    fn admit<E>(&self) -> Result<(), BreakerError<E>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => match inner.open_until {
                Some(until) if now < until => Err(BreakerError::Open {
                    retry_in: until - now,
                }),
                _ => {
                    inner.state = BreakerState::HalfOpen;
                    inner.open_until = None;
                    inner.trial_started = Some(now);
                    tracing::info!("Circuit breaker half-open, admitting trial call");
                    Ok(())
                }
            },
            BreakerState::HalfOpen => {
                let busy_until = inner.trial_started.map(|started| self.deadline(started));
                match busy_until {
                    Some(until) if now < until => Err(BreakerError::Open {
                        retry_in: until - now,
                    }),
                    _ => {
                        inner.trial_started = Some(now);
                        tracing::debug!("Previous trial abandoned, admitting a new one");
                        Ok(())
                    }
                }
            }
        }
    }

    fn deadline(&self, from: Instant) -> Instant {
        from.checked_add(self.options.reset_timeout())
            .unwrap_or(from + FAR_FUTURE)
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != BreakerState::Closed {
            tracing::info!("Circuit breaker closed");
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        inner.trial_started = None;
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock();
        inner.trial_started = None;
        inner.failure_count = inner.failure_count.saturating_add(1);
        let trip = inner.state == BreakerState::HalfOpen
            || inner.failure_count >= self.options.failure_threshold;
        if trip && inner.state != BreakerState::Open {
            inner.state = BreakerState::Open;
            inner.open_until = Some(self.deadline(Instant::now()));
            tracing::warn!(
                failures = inner.failure_count,
                reset_timeout_ms = self.options.reset_timeout_ms,
                "Circuit breaker opened"
            );
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerOptions::default())
    }
}
