/// Shared application state
use encore_core::PlayAnalytics;
use std::sync::Arc;

/// Default cap on track ids in one batch request
pub const DEFAULT_MAX_BATCH_TRACKS: usize = 500;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<PlayAnalytics>,
    /// Largest `trackIds` list accepted by the batch endpoint
    pub max_batch_tracks: usize,
}

impl AppState {
    pub fn new(analytics: Arc<PlayAnalytics>) -> Self {
        Self {
            analytics,
            max_batch_tracks: DEFAULT_MAX_BATCH_TRACKS,
        }
    }

    pub fn with_max_batch_tracks(mut self, max_batch_tracks: usize) -> Self {
        self.max_batch_tracks = max_batch_tracks;
        self
    }
}
