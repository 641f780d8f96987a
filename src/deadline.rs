//! Cancellable deferred actions backed by tokio tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Handle to an action that runs once after a fixed delay unless cancelled.
///
/// Dropping the handle does not cancel the action. Cancelling an action
/// whose body already started is best-effort; the body must re-check
/// whatever state it acts on.
#[derive(Debug)]
pub struct Deadline {
    handle: AbortHandle,
}

impl Deadline {
    /// Spawn `action` to run after `delay`.
    pub fn schedule<F>(delay: Duration, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        Self {
            handle: task.abort_handle(),
        }
    }

    /// Cancel the action. Safe to call any number of times, and after the
    /// action has already run.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let deadline = Deadline::schedule(Duration::from_secs(30), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(deadline.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_deadline_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let deadline = Deadline::schedule(Duration::from_secs(30), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        deadline.cancel();
        deadline.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_harmless() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let deadline = Deadline::schedule(Duration::from_secs(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        deadline.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_keeps_action_alive() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        drop(Deadline::schedule(Duration::from_secs(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
