use std::future::Future;
use std::time::Duration;

/// Registers deadlines on the runtime's own hashed timing wheel.
///
/// `arm` spawns a task that sleeps for `duration` and then runs `on_fire` --
/// the fire itself happens on a worker thread, never inline on whatever
/// called `arm`. The returned [`TimeoutToken`] cancels the wait.
pub struct TimeoutWheel;

impl TimeoutWheel {
    pub fn arm<F>(duration: Duration, on_fire: F) -> TimeoutToken
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_fire.await;
        });
        TimeoutToken(handle)
    }
}

/// A handle to an armed timeout. Cancelling is idempotent: aborting an
/// already-completed or already-aborted task is a no-op.
#[derive(Debug)]
pub struct TimeoutToken(tokio::task::JoinHandle<()>);

impl TimeoutToken {
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_after_the_duration() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let _token = TimeoutWheel::arm(Duration::from_millis(10), async move {
            flag.store(true, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_prevents_firing() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let token = TimeoutWheel::arm(Duration::from_millis(50), async move {
            flag.store(true, Ordering::SeqCst);
        });
        token.cancel();
        token.cancel();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
