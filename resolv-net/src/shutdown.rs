use tokio::sync::watch;

/// Creates a shutdown signal pair. The handle side lives wherever shutdown
/// is triggered from (the public API); the receiver side is cloned into
/// every in-flight query task so it can race the signal against its own
/// response/timeout wait.
pub fn shutdown_channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle(tx), Shutdown(rx))
}

#[derive(Debug, Clone)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    /// Breaks every query task waiting on the matching [`Shutdown`] out of
    /// its select loop with a `CANCELLED` outcome.
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once [`ShutdownHandle::trigger`] has been called.
    pub async fn triggered(&mut self) {
        while !*self.0.borrow() {
            if self.0.changed().await.is_err() {
                // The handle was dropped without triggering; treat that the
                // same as a trigger so waiters don't hang forever.
                break;
            }
        }
    }
}
