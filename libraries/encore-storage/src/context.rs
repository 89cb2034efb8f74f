use crate::plays;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_core::{
    error::Result, storage::PlayEventStore, NewPlayEvent, PlayCounts, PlayEvent, ReplaceOutcome,
    TrackId, WindowBoundaries,
};
use sqlx::SqlitePool;

/// Play event store backed by `SQLite`
#[derive(Debug, Clone)]
pub struct SqlitePlayStore {
    pool: SqlitePool,
    batch_size: usize,
}

impl SqlitePlayStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: plays::DEFAULT_BATCH_SIZE,
        }
    }

    /// Set how many rows go into one INSERT during bulk writes
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, plays::MAX_BATCH_SIZE);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[async_trait]
impl PlayEventStore for SqlitePlayStore {
    async fn append(&self, event: NewPlayEvent) -> Result<PlayEvent> {
        plays::append(&self.pool, event).await
    }

    async fn delete_all(&self, track_id: TrackId) -> Result<u64> {
        plays::delete_all(&self.pool, track_id).await
    }

    async fn insert_many(&self, events: Vec<NewPlayEvent>) -> Result<u64> {
        plays::insert_many(&self.pool, &events, self.batch_size).await
    }

    async fn replace_all(
        &self,
        track_id: TrackId,
        events: Vec<NewPlayEvent>,
    ) -> Result<ReplaceOutcome> {
        plays::replace_all(&self.pool, track_id, &events, self.batch_size).await
    }

    async fn count_since(&self, track_id: TrackId, since: DateTime<Utc>) -> Result<u64> {
        plays::count_since(&self.pool, track_id, since).await
    }

    async fn count_all(&self, track_id: TrackId) -> Result<u64> {
        plays::count_all(&self.pool, track_id).await
    }

    async fn window_counts(
        &self,
        track_id: TrackId,
        boundaries: &WindowBoundaries,
    ) -> Result<PlayCounts> {
        plays::window_counts(&self.pool, track_id, boundaries).await
    }

    async fn events_for(&self, track_id: TrackId) -> Result<Vec<PlayEvent>> {
        plays::get_by_track(&self.pool, track_id).await
    }
}
