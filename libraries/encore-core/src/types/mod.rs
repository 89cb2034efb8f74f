//! Domain types for Encore

mod counts;
mod ids;
mod play_event;

pub use counts::{
    NormalizedTargets, PlayCountTargets, PlayCounts, TrackPlayCounts, Window, WindowBoundaries,
};
pub use ids::{PlayEventId, TrackId};
pub use play_event::{NewPlayEvent, PlayEvent, ReplaceOutcome};
