//! Cooperative cancellation for arrangement requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::ArrangeError;

/// Shared cancellation flag checked at every suspension point.
///
/// Clones observe the same flag, so the harness can hand one clone to its
/// Ctrl-C handler and another to the in-flight request.
#[derive(Clone)]
pub struct ArrangeToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ArrangeToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request cancellation. Idempotent; wakes any in-flight sleeps.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("cancellation requested");
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail fast if cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), ArrangeError> {
        if self.is_cancelled() {
            Err(ArrangeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Cancellable sleep. Observes cancellation before and after the wait,
    /// and wakes early when `cancel` fires mid-sleep.
    pub async fn sleep(&self, duration: Duration) -> Result<(), ArrangeError> {
        self.checkpoint()?;
        // Subscribe to Notify BEFORE re-checking the flag to avoid a TOCTOU
        // race: cancel() could fire between the check and the await, and
        // notify_waiters() would have no subscribers, losing the wakeup.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return Err(ArrangeError::Cancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.checkpoint(),
            _ = notified => Err(ArrangeError::Cancelled),
        }
    }
}

impl Default for ArrangeToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn checkpoint_reflects_cancel() {
        let token = ArrangeToken::new();
        assert!(token.checkpoint().is_ok());
        token.cancel();
        assert!(matches!(token.checkpoint(), Err(ArrangeError::Cancelled)));
    }

    #[tokio::test]
    async fn sleep_completes_when_not_cancelled() {
        let token = ArrangeToken::new();
        assert!(token.sleep(Duration::from_millis(5)).await.is_ok());
    }

    #[tokio::test]
    async fn sleep_wakes_early_on_cancel() {
        let token = ArrangeToken::new();
        let waker = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            waker.cancel();
        });

        let started = Instant::now();
        let result = token.sleep(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(ArrangeError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn sleep_fails_immediately_when_already_cancelled() {
        let token = ArrangeToken::new();
        token.cancel();
        let result = token.sleep(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(ArrangeError::Cancelled)));
    }
}
