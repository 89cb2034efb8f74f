//! Storage trait for play events

use crate::error::Result;
use crate::types::{NewPlayEvent, PlayCounts, PlayEvent, ReplaceOutcome, TrackId, WindowBoundaries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only play event log with range counts
///
/// Implementations must make [`PlayEventStore::replace_all`] atomic: on any
/// failure the track keeps its previous events.
#[async_trait]
pub trait PlayEventStore: Send + Sync {
    // ========================================================================
    // Writes
    // ========================================================================

    /// Persist one event
    async fn append(&self, event: NewPlayEvent) -> Result<PlayEvent>;

    /// Remove every event for a track, returning how many were removed
    async fn delete_all(&self, track_id: TrackId) -> Result<u64>;

    /// Persist a batch of events as one logical operation
    async fn insert_many(&self, events: Vec<NewPlayEvent>) -> Result<u64>;

    /// Delete a track's history and insert `events` in one transaction
    ///
    /// Every event in `events` must belong to `track_id`.
    async fn replace_all(&self, track_id: TrackId, events: Vec<NewPlayEvent>)
        -> Result<ReplaceOutcome>;

    // ========================================================================
    // Window queries
    // ========================================================================

    /// Count events with `played_at >= since`
    async fn count_since(&self, track_id: TrackId, since: DateTime<Utc>) -> Result<u64>;

    /// Count every event of a track
    async fn count_all(&self, track_id: TrackId) -> Result<u64>;

    /// Counts for every window, read from one consistent view of the track
    ///
    /// Must not be composed from separate `count_*` calls: a write landing
    /// between them could make a narrower window exceed a wider one.
    async fn window_counts(
        &self,
        track_id: TrackId,
        boundaries: &WindowBoundaries,
    ) -> Result<PlayCounts>;

    /// All events of a track ordered by `played_at`
    async fn events_for(&self, track_id: TrackId) -> Result<Vec<PlayEvent>>;
}

/// Reject batches that contain events for another track
pub fn ensure_single_track(track_id: TrackId, events: &[NewPlayEvent]) -> Result<()> {
    match events.iter().find(|e| e.track_id != track_id) {
        Some(stray) => Err(crate::EncoreError::invalid_input(format!(
            "Event for track {} in replace batch for track {}",
            stray.track_id, track_id
        ))),
        None => Ok(()),
    }
}
