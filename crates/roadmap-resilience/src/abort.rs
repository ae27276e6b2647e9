//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable cancellation flag
///
/// Setting it never interrupts a running attempt; retry loops check it
/// between attempts and stop waiting out a backoff delay early.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    /// Create an unset signal
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn abort(&self) {
        if !self.inner.aborted.swap(true, Ordering::SeqCst) {
            tracing::debug!("Abort requested");
        }
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once [`abort`](Self::abort) has been called
    pub async fn aborted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clones_share_state() {
        let signal = AbortSignal::new();
        let other = signal.clone();
        assert!(!other.is_aborted());
        signal.abort();
        assert!(other.is_aborted());
        signal.abort();
        assert!(other.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_wakes_waiters() {
        let signal = AbortSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.aborted().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        signal.abort();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn aborted_returns_immediately_when_already_set() {
        let signal = AbortSignal::new();
        signal.abort();
        signal.aborted().await;
    }
}
