//! In-memory play event store
//!
//! Keeps every track's events behind one async `RwLock`. Used by tests and by
//! tooling that does not need durability.

use crate::error::Result;
use crate::storage::{ensure_single_track, PlayEventStore};
use crate::types::{
    NewPlayEvent, PlayCounts, PlayEvent, PlayEventId, ReplaceOutcome, TrackId, WindowBoundaries,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct MemoryPlayStore {
    events: RwLock<HashMap<TrackId, Vec<PlayEvent>>>,
    next_id: AtomicI64,
}

impl MemoryPlayStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn assign_id(&self, event: NewPlayEvent) -> PlayEvent {
        event.with_id(PlayEventId::new(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    /// Number of events across all tracks
    pub async fn len(&self) -> usize {
        self.events.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryPlayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayEventStore for MemoryPlayStore {
    async fn append(&self, event: NewPlayEvent) -> Result<PlayEvent> {
        let event = self.assign_id(event);
        self.events
            .write()
            .await
            .entry(event.track_id)
            .or_default()
            .push(event.clone());
        Ok(event)
    }

    async fn delete_all(&self, track_id: TrackId) -> Result<u64> {
        let removed = self.events.write().await.remove(&track_id);
        Ok(removed.map_or(0, |events| events.len() as u64))
    }

    async fn insert_many(&self, events: Vec<NewPlayEvent>) -> Result<u64> {
        let inserted = events.len() as u64;
        let events: Vec<PlayEvent> = events.into_iter().map(|e| self.assign_id(e)).collect();

        let mut map = self.events.write().await;
        for event in events {
            map.entry(event.track_id).or_default().push(event);
        }
        Ok(inserted)
    }

    async fn replace_all(
        &self,
        track_id: TrackId,
        events: Vec<NewPlayEvent>,
    ) -> Result<ReplaceOutcome> {
        ensure_single_track(track_id, &events)?;

        let replacement: Vec<PlayEvent> = events.into_iter().map(|e| self.assign_id(e)).collect();
        let inserted = replacement.len() as u64;

        let mut map = self.events.write().await;
        let deleted = if replacement.is_empty() {
            map.remove(&track_id)
        } else {
            map.insert(track_id, replacement)
        }
        .map_or(0, |old| old.len() as u64);

        Ok(ReplaceOutcome { deleted, inserted })
    }

    async fn count_since(&self, track_id: TrackId, since: DateTime<Utc>) -> Result<u64> {
        let map = self.events.read().await;
        Ok(map.get(&track_id).map_or(0, |events| {
            events.iter().filter(|e| e.played_at >= since).count() as u64
        }))
    }

    async fn count_all(&self, track_id: TrackId) -> Result<u64> {
        let map = self.events.read().await;
        Ok(map.get(&track_id).map_or(0, |events| events.len() as u64))
    }

    async fn window_counts(
        &self,
        track_id: TrackId,
        boundaries: &WindowBoundaries,
    ) -> Result<PlayCounts> {
        let map = self.events.read().await;
        let Some(events) = map.get(&track_id) else {
            return Ok(PlayCounts::default());
        };

        let since = |t: DateTime<Utc>| events.iter().filter(|e| e.played_at >= t).count() as u64;
        Ok(PlayCounts {
            all: events.len() as u64,
            month: since(boundaries.month),
            week: since(boundaries.week),
            day: since(boundaries.day),
        })
    }

    async fn events_for(&self, track_id: TrackId) -> Result<Vec<PlayEvent>> {
        let map = self.events.read().await;
        let mut events = map.get(&track_id).cloned().unwrap_or_default();
        events.sort_by_key(|e| (e.played_at, e.id));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hours_ago: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap() - Duration::hours(hours_ago)
    }

    #[tokio::test]
    async fn test_append_assigns_unique_ids() {
        let store = MemoryPlayStore::new();
        let track = TrackId::new(1);

        let first = store.append(NewPlayEvent::new(track, at(0))).await.unwrap();
        let second = store.append(NewPlayEvent::new(track, at(0))).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.count_all(track).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_since_is_inclusive() {
        let store = MemoryPlayStore::new();
        let track = TrackId::new(1);
        for hours in [0, 5, 10] {
            store.append(NewPlayEvent::new(track, at(hours))).await.unwrap();
        }

        assert_eq!(store.count_since(track, at(5)).await.unwrap(), 2);
        assert_eq!(store.count_since(track, at(11)).await.unwrap(), 3);
        assert_eq!(store.count_since(TrackId::new(2), at(11)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_window_counts_read_every_window() {
        let store = MemoryPlayStore::new();
        let track = TrackId::new(1);
        for hours in [0, 30, 24 * 10, 24 * 90] {
            store.append(NewPlayEvent::new(track, at(hours))).await.unwrap();
        }

        let boundaries = WindowBoundaries::at(at(0));
        assert_eq!(
            store.window_counts(track, &boundaries).await.unwrap(),
            PlayCounts::new(4, 3, 2, 1)
        );
        assert_eq!(
            store.window_counts(TrackId::new(2), &boundaries).await.unwrap(),
            PlayCounts::default()
        );
    }

    #[tokio::test]
    async fn test_delete_all_is_idempotent() {
        let store = MemoryPlayStore::new();
        let track = TrackId::new(3);
        store.append(NewPlayEvent::new(track, at(1))).await.unwrap();

        assert_eq!(store.delete_all(track).await.unwrap(), 1);
        assert_eq!(store.delete_all(track).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_all_only_touches_one_track() {
        let store = MemoryPlayStore::new();
        let (a, b) = (TrackId::new(1), TrackId::new(2));
        store.append(NewPlayEvent::new(a, at(1))).await.unwrap();
        store.append(NewPlayEvent::new(b, at(1))).await.unwrap();

        let outcome = store
            .replace_all(a, vec![NewPlayEvent::new(a, at(2)), NewPlayEvent::new(a, at(3))])
            .await
            .unwrap();

        assert_eq!(outcome, ReplaceOutcome { deleted: 1, inserted: 2 });
        assert_eq!(store.count_all(a).await.unwrap(), 2);
        assert_eq!(store.count_all(b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_all_rejects_foreign_events() {
        let store = MemoryPlayStore::new();
        let (a, b) = (TrackId::new(1), TrackId::new(2));
        store.append(NewPlayEvent::new(a, at(1))).await.unwrap();

        let result = store.replace_all(a, vec![NewPlayEvent::new(b, at(2))]).await;

        assert!(result.is_err());
        assert_eq!(store.count_all(a).await.unwrap(), 1);
    }
}
