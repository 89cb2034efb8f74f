//! Aggregate snapshot builder

use crate::error::Result;
use crate::storage::PlayEventStore;
use crate::types::{PlayCounts, TrackId, WindowBoundaries};

/// Count a track's events in every window against the same boundaries
///
/// The store reads all four windows in one pass, so the result is nested even
/// while plays or backfills for the track are in flight.
pub async fn build_snapshot(
    store: &dyn PlayEventStore,
    track_id: TrackId,
    boundaries: &WindowBoundaries,
) -> Result<PlayCounts> {
    store.window_counts(track_id, boundaries).await
}
