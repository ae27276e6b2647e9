//! Exponential-backoff retry
//!
//! Attempt `n` (0-based) that fails waits
//! `min(base_delay * backoff_factor^n, max_delay)` before the next attempt,
//! scaled by a uniform factor in `[0.5, 1.0]` when jitter is on. At most
//! `max_retries + 1` attempts are made; the last error is returned as is.

use crate::abort::AbortSignal;
use crate::error::RetryError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Lower bound of the jitter factor
const JITTER_MIN: f64 = 0.5;

/// Maps a failed attempt index to the delay before the next one
pub trait BackoffPolicy {
    /// Deterministic delay after `attempt` (0-based) failed
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

/// Retry tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay after the first failure, in milliseconds
    pub base_delay_ms: u64,
    /// Cap on any single delay, in milliseconds
    pub max_delay_ms: u64,
    /// Growth per attempt
    pub backoff_factor: f64,
    /// Scale delays by a random factor in `[0.5, 1.0]`
    pub jitter: bool,
}

impl RetryOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry count
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// With base delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = millis(delay);
        self
    }

    /// With delay cap
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = millis(delay);
        self
    }

    /// With growth factor
    #[inline]
    #[must_use]
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// With or without jitter
    #[inline]
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts, first one included
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl BackoffPolicy for RetryOptions {
    #[allow(clippy::cast_precision_loss)]
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let max = self.max_delay_ms as f64;
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powf(f64::from(attempt));
        let ms = if raw.is_nan() { max } else { raw.min(max) };
        Duration::try_from_secs_f64(ms / 1000.0)
            .unwrap_or_else(|_| Duration::from_millis(self.max_delay_ms))
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Retries a fallible async operation with exponential backoff
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    options: RetryOptions,
}

impl RetryPolicy {
    /// Create policy from options
    #[inline]
    #[must_use]
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Delay after `attempt` failed, jitter applied
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.options.delay_for_attempt(attempt);
        if self.options.jitter {
            delay.mul_f64(rand::rng().random_range(JITTER_MIN..=1.0))
        } else {
            delay
        }
    }

    /// Run `operation` until it succeeds or attempts run out
    ///
    /// Every error is retried. On exhaustion the last error is returned
    /// unchanged.
    ///
    /// # Errors
    /// The operation's last error.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.drive(operation, None, |_| true)
            .await
            .map_err(RetryError::into_inner)
    }

    /// Run `operation`, retrying only errors `should_retry` accepts and
    /// stopping early once `signal` is aborted
    ///
    /// The signal is checked after each failed attempt and while waiting
    /// out the backoff delay; a running attempt is never interrupted.
    ///
    /// # Errors
    /// [`RetryError::Aborted`] if the signal stopped the loop, otherwise
    /// [`RetryError::Failed`] with the last error.
    pub async fn run_until<T, E, F, Fut, P>(
        &self,
        operation: F,
        signal: &AbortSignal,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        self.drive(operation, Some(signal), should_retry).await
    }

    async fn drive<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        signal: Option<&AbortSignal>,
        should_retry: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt: u32 = 0;
        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if attempt >= self.options.max_retries || !should_retry(&error) {
                tracing::debug!(attempt, error = %error, "Giving up");
                return Err(RetryError::Failed(error));
            }
            if signal.is_some_and(AbortSignal::is_aborted) {
                return Err(RetryError::Aborted(error));
            }

            let delay = self.delay(attempt);
            tracing::warn!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Attempt failed, retrying"
            );

            match signal {
                Some(signal) => {
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = signal.aborted() => return Err(RetryError::Aborted(error)),
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_jitter() -> RetryOptions {
        RetryOptions::default().with_jitter(false)
    }

    #[test]
    fn defaults() {
        let options = RetryOptions::default();
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.max_attempts(), 4);
        assert_eq!(options.base_delay_ms, 1000);
        assert_eq!(options.max_delay_ms, 10_000);
        assert!(options.jitter);
    }

    #[test]
    fn delays_grow_then_cap() {
        let options = no_jitter();
        let delays: Vec<_> = (0..6).map(|a| options.delay_for_attempt(a).as_millis()).collect();
        assert_eq!(delays, [1000, 2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn absurd_factor_still_capped() {
        let options = no_jitter().with_backoff_factor(f64::MAX);
        assert_eq!(options.delay_for_attempt(40), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_in_band() {
        let policy = RetryPolicy::new(RetryOptions::default());
        for attempt in 0..4 {
            let nominal = policy.options().delay_for_attempt(attempt);
            for _ in 0..50 {
                let delay = policy.delay(attempt);
                assert!(delay <= nominal);
                assert!(delay >= nominal.mul_f64(JITTER_MIN));
            }
        }
    }

    #[test]
    fn builder_sets_durations_in_millis() {
        let options = RetryOptions::new()
            .with_base_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(3))
            .with_max_retries(1);
        assert_eq!(options.base_delay_ms, 250);
        assert_eq!(options.max_delay_ms, 3000);
        assert_eq!(options.max_attempts(), 2);
    }
}
