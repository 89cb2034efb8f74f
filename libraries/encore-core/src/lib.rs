//! Encore Core
//!
//! Play-event store abstraction and time-windowed play analytics.
//!
//! This crate is storage-agnostic: it defines the [`PlayEventStore`] trait and
//! everything built on top of it.
//!
//! # Architecture
//!
//! - **Event Store**: append-only log of play events (`storage`, `memory`)
//! - **Window Query**: counts at or after an instant (`PlayEventStore::count_since`)
//! - **Snapshot Builder**: day/week/month/all-time counts from one captured `now`
//! - **Backfill Synthesizer**: replaces a track's history so its snapshot
//!   matches supplied targets (`backfill`, `PlayAnalytics::set_aggregate_counts`)
//!
//! # Example
//!
//! ```rust
//! use encore_core::{MemoryPlayStore, PlayAnalytics, PlayCountTargets, SystemClock, TrackId};
//! use std::sync::Arc;
//!
//! # async fn example() -> encore_core::Result<()> {
//! let analytics = PlayAnalytics::new(Arc::new(MemoryPlayStore::new()), Arc::new(SystemClock));
//!
//! analytics.record_play(TrackId::new(7)).await?;
//! analytics
//!     .set_aggregate_counts(TrackId::new(8), PlayCountTargets::new(100, 40, 10, 3))
//!     .await?;
//!
//! let counts = analytics.snapshot(TrackId::new(8)).await?;
//! assert_eq!((counts.all, counts.month, counts.week, counts.day), (100, 40, 10, 3));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod analytics;
pub mod backfill;
pub mod clock;
pub mod error;
pub mod locks;
pub mod memory;
pub mod snapshot;
pub mod storage;
pub mod types;

pub use analytics::{AnalyticsConfig, BackfillReport, PlayAnalytics};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EncoreError, Result};
pub use memory::MemoryPlayStore;
pub use storage::PlayEventStore;
pub use types::{
    NewPlayEvent, NormalizedTargets, PlayCountTargets, PlayCounts, PlayEvent, PlayEventId,
    ReplaceOutcome, TrackId, TrackPlayCounts, Window, WindowBoundaries,
};
