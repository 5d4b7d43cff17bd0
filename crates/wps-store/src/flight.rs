//! # Generation Locks
//!
//! Per-artifact-path single-flight. The first request for a missing artifact
//! takes the lock and generates; concurrent requests for the same path wait
//! on the lock, then re-check the store and find the artifact already there.
//!
//! Entries exist only while someone holds or waits on them. The last guard
//! to drop removes its entry, so the map never grows with the number of
//! distinct images served.
//!
//! Locks are `tokio::sync::Mutex` because they are held across the
//! transcode `.await`. The map itself is a `DashMap`; its shard locks are
//! never held across an await point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<PathBuf, Arc<Mutex<()>>>;

/// Registry of in-flight artifact generations, keyed by artifact path.
///
/// Cheaply cloneable; all clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct GenerationLocks {
    inner: Arc<LockMap>,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other generation for `artifact_path` is running, then
    /// hold the path until the returned guard is dropped.
    pub async fn acquire(&self, artifact_path: &Path) -> FlightGuard {
        let mutex = {
            let entry = self
                .inner
                .entry(artifact_path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        let guard = mutex.lock_owned().await;
        FlightGuard {
            key: artifact_path.to_path_buf(),
            locks: Arc::clone(&self.inner),
            _guard: guard,
        }
    }

    /// Number of paths currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.inner.len()
    }
}

/// Exclusive hold on one artifact path.
#[derive(Debug)]
pub struct FlightGuard {
    key: PathBuf,
    locks: Arc<LockMap>,
    _guard: OwnedMutexGuard<()>,
}

impl FlightGuard {
    pub fn artifact_path(&self) -> &Path {
        &self.key
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // One reference in the map, one in our guard. Anything above that is
        // a waiter that still needs the entry.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) <= 2);
    }
}
