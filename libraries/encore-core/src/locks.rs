//! Per-track read/write locks
//!
//! Appends take the shared side so they never wait on each other. A backfill
//! takes the exclusive side, which keeps appends for the same track out of
//! the window between deleting the old history and inserting the new one.

use crate::types::TrackId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Entries above this count trigger a sweep of idle locks
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct TrackLocks {
    locks: Mutex<HashMap<TrackId, Arc<RwLock<()>>>>,
}

impl TrackLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, track_id: TrackId) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if locks.len() >= PRUNE_THRESHOLD {
            // Only the map holds an idle lock; held guards keep their own Arc.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        Arc::clone(locks.entry(track_id).or_default())
    }

    /// Acquire the shared side for `track_id`
    pub async fn shared(&self, track_id: TrackId) -> OwnedRwLockReadGuard<()> {
        self.lock_for(track_id).read_owned().await
    }

    /// Acquire the exclusive side for `track_id`
    pub async fn exclusive(&self, track_id: TrackId) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(track_id).write_owned().await
    }

    /// Number of tracked lock entries
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
