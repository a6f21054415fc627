//! Cancellation and progress reporting for cell runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Handle for cancelling a running cell.
///
/// Any clone can trigger the cancellation and every clone observes it.
///
/// # Example
///
/// ```
/// use mdlab_core::execute::CancelToken;
///
/// let token = CancelToken::new();
/// let clone = token.clone();
///
/// assert!(!token.is_cancelled());
/// clone.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation. Repeated calls have no further effect.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Callback trait for run progress reporting.
///
/// `position` is the cell's index in the document.
pub trait ExecutionObserver: Send + Sync {
    /// Called when a run is accepted, before anything is spawned.
    fn on_started(&self, _position: usize) {}

    /// Called with the cell's current visible output while the process runs.
    fn on_output(&self, _position: usize, _output: &str) {}

    /// Called exactly once per run.
    fn on_finished(&self, _position: usize, _success: bool) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

/// Latch guarding the single `on_finished` call of a run.
///
/// Process exit and cancellation may both try to end a run; only the first
/// call wins.
#[derive(Debug, Default)]
pub struct Completion {
    done: AtomicBool,
}

impl Completion {
    /// Create an unfinished latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the end of the run. Returns `false` if it was already reported.
    pub fn finish(
        &self,
        observer: &dyn ExecutionObserver,
        position: usize,
        success: bool,
    ) -> bool {
        if self.done.swap(true, Ordering::SeqCst) {
            tracing::debug!("Cell {} already finished, ignoring", position);
            return false;
        }
        observer.on_finished(position, success);
        true
    }

    /// Whether the run has been reported as finished.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        finished: Mutex<Vec<(usize, bool)>>,
    }

    impl ExecutionObserver for Recorder {
        fn on_finished(&self, position: usize, success: bool) {
            self.finished.lock().unwrap().push((position, success));
        }
    }

    #[test]
    fn test_cancel_token_clone_shares_state() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!token.is_cancelled());
        clone.cancel();
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let token = CancelToken::new();
        let clone = token.clone();

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already cancelled");
    }

    #[test]
    fn test_completion_reports_once() {
        let recorder = Recorder::default();
        let completion = Completion::new();

        assert!(!completion.is_done());
        assert!(completion.finish(&recorder, 3, false));
        assert!(!completion.finish(&recorder, 3, true));

        assert!(completion.is_done());
        assert_eq!(*recorder.finished.lock().unwrap(), vec![(3, false)]);
    }
}
