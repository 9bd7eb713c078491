//! Process-wide snapshot cache (spec.md §5): a bounded LRU keyed by
//! snapshot id, guarded by a single mutex that is never held across I/O.

use buildgraph_core::Snapshot;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 20;

/// Holds decoded [`Snapshot`]s. `get_or_load` implements the
/// release-lock-before-I/O, re-acquire-to-insert protocol: a miss drops
/// the lock, runs the caller-supplied loader, then re-acquires the lock
/// to insert. A concurrent double-load is accepted — the second
/// insertion simply overwrites or is evicted in turn, never corrupting
/// the cache.
pub struct SnapshotCache {
    inner: Mutex<LruCache<Uuid, Snapshot>>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached snapshot if present, without touching the
    /// loader.
    pub fn peek(&self, id: Uuid) -> Option<Snapshot> {
        self.inner.lock().get(&id).cloned()
    }

    pub fn insert(&self, id: Uuid, snapshot: Snapshot) {
        self.inner.lock().put(id, snapshot);
    }

    /// Loads a snapshot, consulting the cache first. `loader` is only
    /// invoked on a miss and runs with the mutex released.
    pub async fn get_or_load<F, Fut, E>(&self, id: Uuid, loader: F) -> Result<Snapshot, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Snapshot, E>>,
    {
        if let Some(hit) = self.inner.lock().get(&id).cloned() {
            return Ok(hit);
        }
        let loaded = loader().await?;
        self.inner.lock().put(id, loaded.clone());
        Ok(loaded)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::Snapshot;

    #[test]
    fn bounded_by_capacity() {
        let cache = SnapshotCache::new(2);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            cache.insert(*id, Snapshot::new("c", "main"));
        }
        assert!(cache.len() <= 2);
        // Oldest insertion was evicted.
        assert!(cache.peek(ids[0]).is_none());
        assert!(cache.peek(ids[2]).is_some());
    }

    #[tokio::test]
    async fn get_or_load_only_invokes_loader_on_miss() {
        let cache = SnapshotCache::new(10);
        let id = Uuid::new_v4();
        let mut loads = 0;

        let result: Result<Snapshot, std::convert::Infallible> = cache
            .get_or_load(id, || async { Ok(Snapshot::new("c", "main")) })
            .await;
        assert!(result.is_ok());

        // Second call hits the cache; the loader closure below must not run.
        let second: Result<Snapshot, std::convert::Infallible> = cache
            .get_or_load(id, || {
                loads += 1;
                async move { Ok(Snapshot::new("other", "main")) }
            })
            .await;
        assert_eq!(second.unwrap().commit_sha, "c");
        assert_eq!(loads, 0);
    }
}
