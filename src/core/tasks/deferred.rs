// Bounded deferred values. A `Deferred<T>` is a value that becomes available
// after a delay, backed by a runtime task instead of a bare timer, so it can
// be cancelled explicitly and never outlives its handle.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// No deferred value may take longer than this to resolve.
pub const MAX_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeferredError {
    #[error("Deferred value was cancelled before it resolved")]
    Cancelled,
}

/// Cancels the backing task of a `Deferred` from somewhere else, for example
/// a cancel endpoint while a handler is waiting. Cancelling after the value
/// resolved is a no-op.
#[derive(Debug, Clone)]
pub struct DeferredHandle {
    abort: AbortHandle,
}

impl DeferredHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

/// A value that resolves after a bounded delay.
///
/// Dropping the `Deferred` without waiting aborts the backing task, so an
/// abandoned one leaves nothing running.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<T>,
    abort: AbortHandle,
    delay: Duration,
}

impl<T: Send + 'static> Deferred<T> {
    /// Schedule `value` to become available after `delay`, clamped to
    /// `MAX_DELAY`.
    pub fn resolve_after(value: T, delay: Duration) -> Self {
        let delay = delay.min(MAX_DELAY);
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(value);
        });
        Self {
            rx,
            abort: task.abort_handle(),
            delay,
        }
    }
}

impl<T> Deferred<T> {
    /// The clamped delay this value was scheduled with.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn cancel_handle(&self) -> DeferredHandle {
        DeferredHandle {
            abort: self.abort.clone(),
        }
    }

    /// Wait for the value. Returns `Cancelled` when the backing task was
    /// aborted first.
    pub async fn wait(mut self) -> Result<T, DeferredError> {
        (&mut self.rx).await.map_err(|_| DeferredError::Cancelled)
    }

    /// Give up on the value and abort the backing task.
    pub fn cancel(self) {
        self.abort.abort();
    }
}

impl<T> Drop for Deferred<T> {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn the_value_arrives_after_the_delay() {
        let started = Instant::now();
        let deferred = Deferred::resolve_after(42, Duration::from_millis(10));

        let value = deferred.wait().await;

        assert_eq!(value, Ok(42));
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn delays_are_clamped_to_the_maximum() {
        let deferred = Deferred::resolve_after((), Duration::from_secs(600));

        assert_eq!(deferred.delay(), MAX_DELAY);
    }

    #[tokio::test]
    async fn cancelling_before_the_wait_is_observable() {
        let deferred = Deferred::resolve_after(7, Duration::from_secs(5));
        let handle = deferred.cancel_handle();

        handle.cancel();
        let result = deferred.wait().await;

        assert_eq!(result, Err(DeferredError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_an_active_wait() {
        let deferred = Deferred::resolve_after(7, Duration::from_secs(5));
        let handle = deferred.cancel_handle();
        let waiter = tokio::spawn(async move { deferred.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        let result = waiter.await.unwrap();
        assert_eq!(result, Err(DeferredError::Cancelled));
    }

    #[tokio::test]
    async fn cancelling_a_resolved_value_changes_nothing() {
        let deferred = Deferred::resolve_after(1, Duration::from_millis(5));
        let handle = deferred.cancel_handle();

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();

        assert_eq!(deferred.wait().await, Ok(1));
    }
}
