use resolv_net::{shutdown_channel, Shutdown, ShutdownHandle};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// The set of outstanding queries, indexed by their 16-bit id. This is the
/// sole external handle used to cancel a query, and the invariant the tests
/// care about: it must be empty once every submitted query has completed.
#[derive(Default)]
pub struct QueryRegistry {
    active: Mutex<HashMap<u16, ShutdownHandle>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id not currently in use and registers its shutdown
    /// handle atomically, so two concurrent allocations can never collide.
    pub async fn allocate(&self) -> (u16, Shutdown) {
        let (handle, shutdown) = shutdown_channel();
        let mut guard = self.active.lock().await;
        loop {
            let id: u16 = rand::random();
            if let std::collections::hash_map::Entry::Vacant(entry) = guard.entry(id) {
                entry.insert(handle);
                return (id, shutdown);
            }
        }
    }

    /// Removes and returns the entry for `id`, if it's still outstanding.
    /// This is the "CAS-remove": whichever caller wins the race -- a late
    /// response, a timeout, or an explicit cancel -- is the only one that
    /// gets `Some`, so the completion callback fires exactly once.
    pub async fn remove(&self, id: u16) -> Option<ShutdownHandle> {
        self.active.lock().await.remove(&id)
    }

    /// Cancels an outstanding query. A no-op if it already completed.
    pub async fn cancel(&self, id: u16) -> bool {
        match self.remove(id).await {
            Some(handle) => {
                handle.trigger();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.active.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocated_ids_are_registered_and_removable() {
        let registry = QueryRegistry::new();
        let (id, _shutdown) = registry.allocate().await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.remove(id).await.is_some());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn cancel_after_completion_is_a_no_op() {
        let registry = QueryRegistry::new();
        let (id, _shutdown) = registry.allocate().await;
        registry.remove(id).await;
        assert!(!registry.cancel(id).await);
    }

    #[tokio::test]
    async fn cancel_triggers_the_shutdown_signal() {
        let registry = QueryRegistry::new();
        let (id, mut shutdown) = registry.allocate().await;
        assert!(registry.cancel(id).await);
        shutdown.triggered().await;
        assert!(shutdown.is_triggered());
    }
}
