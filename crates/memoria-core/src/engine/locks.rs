//! Sharded per-memory-id locks so concurrent updates to the same
//! memory serialize while updates to different memories run in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct MemoryLocks {
    shards: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MemoryLocks {
    pub fn new() -> Self {
        Self { shards: SyncMutex::new(HashMap::new()) }
    }

    /// Acquires the lock for `id`, creating it on first use. The
    /// returned guard releases the lock on drop; the entry itself is
    /// left in the map for reuse rather than cleaned up, since the set
    /// of distinct memory ids is bounded by what's actually been
    /// touched in this process's lifetime.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut shards = self.shards.lock().expect("lock shard map poisoned");
            shards.entry(id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
        };
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_serializes() {
        let locks = MemoryLocks::new();
        let _g1 = locks.lock("a").await;
        assert!(locks.shards.lock().unwrap().contains_key("a"));
    }

    #[tokio::test]
    async fn different_ids_do_not_share_a_mutex() {
        let locks = MemoryLocks::new();
        let g1 = locks.lock("a").await;
        let g2 = locks.lock("b").await;
        drop(g1);
        drop(g2);
    }
}
