//! Per-key mutual exclusion.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

/// Errors from lock acquisition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    /// The key is held by another task.
    #[error("lock busy")]
    Busy,

    /// The wait was cancelled.
    #[error("lock wait cancelled")]
    Cancelled,
}

#[derive(Debug)]
struct Entry {
    lock: Arc<AsyncMutex<()>>,
    /// Guards plus waiters currently referencing the entry.
    refs: usize,
}

type KeyTable = Arc<Mutex<HashMap<String, Entry>>>;

/// Keyed mutual exclusion with FIFO fairness.
///
/// Exactly one [`LockGuard`] exists per key at a time; different keys are
/// fully independent. Waiters on the same key are granted the lock in
/// arrival order (the underlying async mutex is fair). Entries leave the
/// key table when the last guard or waiter for the key goes away.
///
/// An in-process table satisfies the single-writer-per-document contract
/// for one server; a distributed implementation would provide the same
/// interface over a coordination service.
#[derive(Default)]
pub struct LockManager {
    keys: KeyTable,
}

impl LockManager {
    /// Creates an empty lock manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting until it is free.
    ///
    /// The wait is raced against `token`; cancellation surfaces as
    /// [`LockError::Cancelled`] and leaves no trace in the key table.
    pub async fn lock(
        &self,
        key: &str,
        token: &CancellationToken,
    ) -> Result<LockGuard, LockError> {
        let (lock, release) = self.checkout(key);
        tokio::select! {
            // Checked first so an already-cancelled token never acquires.
            biased;
            () = token.cancelled() => Err(LockError::Cancelled),
            guard = lock.lock_owned() => Ok(LockGuard {
                guard: Some(guard),
                release,
            }),
        }
    }

    /// Acquires the lock for `key` only if it is free right now.
    pub fn try_lock(&self, key: &str) -> Result<LockGuard, LockError> {
        let (lock, release) = self.checkout(key);
        match lock.try_lock_owned() {
            Ok(guard) => Ok(LockGuard {
                guard: Some(guard),
                release,
            }),
            Err(_) => Err(LockError::Busy),
        }
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.lock().len()
    }

    fn checkout(&self, key: &str) -> (Arc<AsyncMutex<()>>, RefRelease) {
        let mut keys = self.keys.lock();
        let entry = keys.entry(key.to_owned()).or_insert_with(|| Entry {
            lock: Arc::new(AsyncMutex::new(())),
            refs: 0,
        });
        entry.refs += 1;
        (
            Arc::clone(&entry.lock),
            RefRelease {
                key: key.to_owned(),
                keys: Arc::clone(&self.keys),
            },
        )
    }
}

/// Holds one reference on a key table entry; dropping it removes the entry
/// once nothing else references it.
#[derive(Debug)]
struct RefRelease {
    key: String,
    keys: KeyTable,
}

impl Drop for RefRelease {
    fn drop(&mut self) {
        let mut keys = self.keys.lock();
        if let Some(entry) = keys.get_mut(&self.key) {
            entry.refs -= 1;
            if entry.refs == 0 {
                keys.remove(&self.key);
            }
        }
    }
}

/// Exclusive hold on a key. The key unlocks when the guard drops.
#[derive(Debug)]
pub struct LockGuard {
    // Declaration order matters: the mutex guard must drop before the
    // table reference.
    guard: Option<OwnedMutexGuard<()>>,
    #[allow(dead_code)]
    release: RefRelease,
}

impl LockGuard {
    /// Releases the lock explicitly.
    pub fn unlock(self) {}
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.guard.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn exclusive_per_key() {
        let manager = LockManager::new();
        let token = CancellationToken::new();

        let guard = manager.lock("push-pull:a", &token).await.unwrap();
        assert_eq!(
            manager.try_lock("push-pull:a").unwrap_err(),
            LockError::Busy
        );

        guard.unlock();
        assert!(manager.try_lock("push-pull:a").is_ok());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let manager = LockManager::new();
        let _a = manager.try_lock("push-pull:a").unwrap();
        let _b = manager.try_lock("push-pull:b").unwrap();
        let _s = manager.try_lock("snapshot:a").unwrap();
        assert_eq!(manager.key_count(), 3);
    }

    #[tokio::test]
    async fn table_empties_after_release() {
        let manager = LockManager::new();
        let token = CancellationToken::new();

        let guard = manager.lock("push-pull:a", &token).await.unwrap();
        assert_eq!(manager.key_count(), 1);
        drop(guard);
        assert_eq!(manager.key_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_surfaces_and_leaves_no_trace() {
        let manager = LockManager::new();
        let token = CancellationToken::new();

        let held = manager.lock("push-pull:a", &token).await.unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let err = manager.lock("push-pull:a", &cancelled).await.unwrap_err();
        assert_eq!(err, LockError::Cancelled);

        drop(held);
        assert_eq!(manager.key_count(), 0);
    }

    #[tokio::test]
    async fn waiters_are_served_in_order() {
        let manager = Arc::new(LockManager::new());
        let token = CancellationToken::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let first = manager.lock("push-pull:a", &token).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..3 {
            let manager = Arc::clone(&manager);
            let token = token.clone();
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let guard = manager.lock("push-pull:a", &token).await.unwrap();
                tx.send(i).unwrap();
                drop(guard);
            }));
            // Let the waiter reach the queue before spawning the next one.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(first);
        let mut order = Vec::new();
        for _ in 0..3 {
            order.push(
                timeout(Duration::from_secs(1), rx.recv())
                    .await
                    .unwrap()
                    .unwrap(),
            );
        }
        assert_eq!(order, vec![0, 1, 2]);

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
