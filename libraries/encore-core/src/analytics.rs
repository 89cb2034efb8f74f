//! Play analytics service
//!
//! Ties the event store, the clock and the per-track locks together into the
//! three operations callers use: record a play, read a snapshot, and replace
//! a track's history from aggregate targets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backfill::{BackfillPlan, BAND_CAPACITY};
use crate::clock::Clock;
use crate::error::{EncoreError, Result};
use crate::locks::TrackLocks;
use crate::snapshot::build_snapshot;
use crate::storage::PlayEventStore;
use crate::types::{
    NewPlayEvent, PlayCountTargets, PlayCounts, PlayEvent, TrackId, TrackPlayCounts, Window,
    WindowBoundaries,
};

/// Tunables for [`PlayAnalytics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Upper bound on the events a single backfill may create
    #[serde(default = "default_max_backfill_events")]
    pub max_backfill_events: u64,
}

fn default_max_backfill_events() -> u64 {
    1_000_000
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            max_backfill_events: default_max_backfill_events(),
        }
    }
}

impl AnalyticsConfig {
    /// Check the limits are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_backfill_events == 0 {
            return Err(EncoreError::invalid_input(
                "max_backfill_events must be greater than zero",
            ));
        }
        if self.max_backfill_events > BAND_CAPACITY {
            return Err(EncoreError::invalid_input(format!(
                "max_backfill_events must not exceed {BAND_CAPACITY}"
            )));
        }
        Ok(())
    }
}

/// What a backfill did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub track_id: TrackId,
    /// Targets after sanitizing and nesting repair
    pub targets: PlayCounts,
    pub deleted: u64,
    pub inserted: u64,
}

pub struct PlayAnalytics {
    store: Arc<dyn PlayEventStore>,
    clock: Arc<dyn Clock>,
    locks: TrackLocks,
    config: AnalyticsConfig,
}

impl PlayAnalytics {
    pub fn new(store: Arc<dyn PlayEventStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: TrackLocks::new(),
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PlayEventStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Record one play of `track_id` at the current instant
    pub async fn record_play(&self, track_id: TrackId) -> Result<PlayEvent> {
        let _guard = self.locks.shared(track_id).await;
        let event = self
            .store
            .append(NewPlayEvent::new(track_id, self.clock.now()))
            .await?;

        tracing::debug!(track_id = %track_id, event_id = %event.id, "Recorded play");
        Ok(event)
    }

    /// Count events at or after `since`
    pub async fn count_since(&self, track_id: TrackId, since: DateTime<Utc>) -> Result<u64> {
        self.store.count_since(track_id, since).await
    }

    /// Counts for every window, relative to one captured `now`
    pub async fn snapshot(&self, track_id: TrackId) -> Result<PlayCounts> {
        let boundaries = WindowBoundaries::at(self.clock.now());
        build_snapshot(self.store.as_ref(), track_id, &boundaries).await
    }

    /// Snapshot for enrichment paths where counts are optional
    ///
    /// Failures are logged and reported as `None` so the caller's primary
    /// operation can carry on without the counts.
    pub async fn try_snapshot(&self, track_id: TrackId) -> Option<PlayCounts> {
        match self.snapshot(track_id).await {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!(track_id = %track_id, error = %e, "Skipping play counts");
                None
            }
        }
    }

    /// Snapshots for several tracks, all against the same `now`
    pub async fn snapshots(&self, track_ids: &[TrackId]) -> Result<Vec<TrackPlayCounts>> {
        let boundaries = WindowBoundaries::at(self.clock.now());

        let mut results = Vec::with_capacity(track_ids.len());
        for &track_id in track_ids {
            let counts = build_snapshot(self.store.as_ref(), track_id, &boundaries).await?;
            results.push(TrackPlayCounts { track_id, counts });
        }
        Ok(results)
    }

    /// Tracks ordered by their count in `window`, most played first
    ///
    /// Ties keep the order of `track_ids`.
    pub async fn ranked(
        &self,
        track_ids: &[TrackId],
        window: Window,
        limit: Option<usize>,
    ) -> Result<Vec<TrackPlayCounts>> {
        let mut results = self.snapshots(track_ids).await?;
        results.sort_by(|a, b| b.counts.get(window).cmp(&a.counts.get(window)));
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Replace a track's history so its snapshot matches `targets`
    ///
    /// Targets are sanitized first (missing/negative become zero, `all` is
    /// raised to the largest window). Oversized requests are rejected before
    /// anything is deleted; the cap applies to the events the plan would
    /// actually write, which exceeds `all` when inner windows are
    /// inconsistent. The delete and the insert run as one store transaction
    /// while holding the track's exclusive lock.
    pub async fn set_aggregate_counts(
        &self,
        track_id: TrackId,
        targets: PlayCountTargets,
    ) -> Result<BackfillReport> {
        let normalized = targets.normalize();
        let limit = self.config.max_backfill_events;
        if normalized.total() > limit {
            return Err(EncoreError::BackfillTooLarge {
                track_id,
                requested: normalized.total(),
                limit,
            });
        }

        let _guard = self.locks.exclusive(track_id).await;

        let plan = BackfillPlan::new(track_id, normalized, self.clock.now())?;
        if plan.len() > limit {
            return Err(EncoreError::BackfillTooLarge {
                track_id,
                requested: plan.len(),
                limit,
            });
        }
        let events = plan.events();

        let outcome = self.store.replace_all(track_id, events).await?;

        tracing::info!(
            track_id = %track_id,
            all = normalized.counts().all,
            month = normalized.counts().month,
            week = normalized.counts().week,
            day = normalized.counts().day,
            deleted = outcome.deleted,
            inserted = outcome.inserted,
            "Backfilled play history"
        );

        Ok(BackfillReport {
            track_id,
            targets: normalized.counts(),
            deleted: outcome.deleted,
            inserted: outcome.inserted,
        })
    }
}
