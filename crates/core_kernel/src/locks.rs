//! Per-key async mutual exclusion
//!
//! [`KeyedLocks`] hands out one async mutex per key so that operations on
//! the same resource (or booking) run one at a time while operations on
//! different keys proceed in parallel. Entries are dropped from the table
//! once no guard or waiter holds them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    table: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of a critical section on one key
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until the lock for `key` is free and takes it
    pub async fn lock(&self, key: &K) -> KeyGuard<'_, K> {
        let slot = {
            let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
            table
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = slot.lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &K) {
        let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
        // The table holds one reference; anything beyond it is a waiter.
        if let Some(slot) = table.get(key) {
            if Arc::strong_count(slot) == 1 {
                table.remove(key);
            }
        }
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_entries_are_pruned() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock(&"tour-1".to_string()).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for _ in 0..16 {
            let locks = locks.clone();
            let inside = inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&1u32).await;
                let now = inside.fetch_add(1, Ordering::SeqCst);
                assert_eq!(now, 0);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(&1u32).await;
        let _b = locks.lock(&2u32).await;
        assert_eq!(locks.len(), 2);
    }
}
