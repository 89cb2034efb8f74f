//! Play event types

use super::ids::{PlayEventId, TrackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded occurrence of a track being played
///
/// `played_at` never changes once the event exists. Events are only ever
/// appended one at a time or replaced wholesale per track by a backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub id: PlayEventId,
    pub track_id: TrackId,
    pub played_at: DateTime<Utc>,
}

/// Data for creating a new play event (the store assigns the id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayEvent {
    pub track_id: TrackId,
    pub played_at: DateTime<Utc>,
}

impl NewPlayEvent {
    pub fn new(track_id: TrackId, played_at: DateTime<Utc>) -> Self {
        Self {
            track_id,
            played_at,
        }
    }

    /// Attach a store-assigned id
    pub fn with_id(self, id: PlayEventId) -> PlayEvent {
        PlayEvent {
            id,
            track_id: self.track_id,
            played_at: self.played_at,
        }
    }
}

/// Result of replacing a track's whole event history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
    pub deleted: u64,
    pub inserted: u64,
}
