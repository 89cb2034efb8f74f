//! Backfill planning
//!
//! Turns normalized window targets into a synthetic event history. The plan is
//! pure: it only computes timestamps, the caller persists them.
//!
//! Events are split into four disjoint buckets, one per window band:
//!
//! | bucket       | size           | band (old side of its inner boundary)       |
//! |--------------|----------------|---------------------------------------------|
//! | `Old`        | `all - month`  | just before the month boundary              |
//! | `MonthOnly`  | `month - week` | just before the week boundary               |
//! | `WeekOnly`   | `week - day`   | just before the day boundary                |
//! | `Day`        | `day`          | the last hour before `now`                  |
//!
//! Each band is [`BAND_WIDTH`] wide and ends [`SAFETY_MARGIN`] before its inner
//! boundary. A bucket's events are spread evenly across the band, so the last
//! timestamp stays inside it no matter how many events the bucket holds, as
//! long as the count fits in [`BAND_CAPACITY`].

use chrono::{DateTime, Duration, Utc};

use crate::error::{EncoreError, Result};
use crate::types::{NewPlayEvent, NormalizedTargets, TrackId, WindowBoundaries};

/// Width of the band a bucket's events are spread over
pub const BAND_WIDTH: Duration = Duration::hours(1);

/// Gap between a band's newest event and the boundary it sits under
pub const SAFETY_MARGIN: Duration = Duration::minutes(1);

/// Largest number of distinct microsecond timestamps a single band can hold
pub const BAND_CAPACITY: u64 = 59 * 60 * 1_000_000;

/// Which window band a bucket fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    /// Older than the month boundary
    Old,
    /// Inside the month, older than the week boundary
    MonthOnly,
    /// Inside the week, older than the day boundary
    WeekOnly,
    /// Inside the day
    Day,
}

/// One bucket of synthetic events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub kind: BucketKind,
    pub count: u64,
    /// Newest timestamp in the bucket
    pub anchor: DateTime<Utc>,
    /// Exclusive lower edge of the band
    pub floor: DateTime<Utc>,
}

impl Bucket {
    fn new(kind: BucketKind, count: u64, inner_boundary: DateTime<Utc>) -> Self {
        Self {
            kind,
            count,
            anchor: inner_boundary - SAFETY_MARGIN,
            floor: inner_boundary - BAND_WIDTH,
        }
    }

    /// Distance between consecutive events, in microseconds
    fn step_micros(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        let width = (self.anchor - self.floor).num_microseconds().unwrap_or(0);
        // count <= BAND_CAPACITY keeps this at least one microsecond
        (width / self.count as i64).max(1)
    }

    /// Timestamps for the bucket, newest first, pairwise distinct
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let step = self.step_micros();
        (0..self.count as i64).map(move |i| self.anchor - Duration::microseconds(step * i))
    }
}

/// A complete synthetic history for one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillPlan {
    pub track_id: TrackId,
    pub targets: NormalizedTargets,
    pub boundaries: WindowBoundaries,
    pub buckets: [Bucket; 4],
}

impl BackfillPlan {
    /// Partition `targets` into buckets relative to `now`
    ///
    /// # Errors
    /// Returns [`EncoreError::BackfillTooLarge`] if a bucket would not fit in
    /// its band.
    pub fn new(track_id: TrackId, targets: NormalizedTargets, now: DateTime<Utc>) -> Result<Self> {
        let boundaries = WindowBoundaries::at(now);
        let counts = targets.counts();

        let buckets = [
            Bucket::new(
                BucketKind::Old,
                counts.all.saturating_sub(counts.month),
                boundaries.month,
            ),
            Bucket::new(
                BucketKind::MonthOnly,
                counts.month.saturating_sub(counts.week),
                boundaries.week,
            ),
            Bucket::new(
                BucketKind::WeekOnly,
                counts.week.saturating_sub(counts.day),
                boundaries.day,
            ),
            Bucket::new(BucketKind::Day, counts.day, boundaries.now),
        ];

        if let Some(oversized) = buckets.iter().find(|b| b.count > BAND_CAPACITY) {
            return Err(EncoreError::BackfillTooLarge {
                track_id,
                requested: oversized.count,
                limit: BAND_CAPACITY,
            });
        }

        Ok(Self {
            track_id,
            targets,
            boundaries,
            buckets,
        })
    }

    /// Number of events the plan generates
    pub fn len(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate every event of the plan
    pub fn events(&self) -> Vec<NewPlayEvent> {
        let mut events = Vec::with_capacity(usize::try_from(self.len()).unwrap_or(0));
        for bucket in &self.buckets {
            events.extend(
                bucket
                    .timestamps()
                    .map(|played_at| NewPlayEvent::new(self.track_id, played_at)),
            );
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayCountTargets, PlayCounts};
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn plan(all: i64, month: i64, week: i64, day: i64) -> BackfillPlan {
        let targets = PlayCountTargets::new(all, month, week, day).normalize();
        BackfillPlan::new(TrackId::new(7), targets, now()).unwrap()
    }

    /// Recount the plan's events the way the window queries do
    fn recount(plan: &BackfillPlan) -> PlayCounts {
        let events = plan.events();
        let b = plan.boundaries;
        let since = |t: DateTime<Utc>| events.iter().filter(|e| e.played_at >= t).count() as u64;
        PlayCounts::new(events.len() as u64, since(b.month), since(b.week), since(b.day))
    }

    #[test]
    fn test_bucket_sizes_follow_window_differences() {
        let plan = plan(100, 40, 10, 3);
        let sizes: Vec<u64> = plan.buckets.iter().map(|b| b.count).collect();

        assert_eq!(sizes, vec![60, 30, 7, 3]);
        assert_eq!(plan.len(), 100);
    }

    #[test]
    fn test_plan_reproduces_targets() {
        let plan = plan(100, 40, 10, 3);
        assert_eq!(recount(&plan), PlayCounts::new(100, 40, 10, 3));
    }

    #[test]
    fn test_week_only_events_sit_just_past_day_boundary() {
        let plan = plan(100, 40, 10, 3);
        let cutoff = now() - Duration::hours(25);
        let seen = plan.events().iter().filter(|e| e.played_at >= cutoff).count();

        assert_eq!(seen, 10);
    }

    #[test]
    fn test_zero_targets_produce_empty_plan() {
        let plan = plan(0, 0, 0, 0);
        assert!(plan.is_empty());
        assert!(plan.events().is_empty());
    }

    #[test]
    fn test_large_buckets_stay_inside_their_band() {
        let plan = plan(250_000, 200_000, 120_000, 50_000);

        for bucket in &plan.buckets {
            let stamps: Vec<_> = bucket.timestamps().collect();
            assert!(stamps.iter().all(|t| *t > bucket.floor && *t <= bucket.anchor));

            let distinct: HashSet<_> = stamps.iter().collect();
            assert_eq!(distinct.len(), stamps.len());
        }
        assert_eq!(recount(&plan), PlayCounts::new(250_000, 200_000, 120_000, 50_000));
    }

    #[test]
    fn test_inconsistent_inner_windows_clamp_bucket_sizes() {
        // week < day: the week-only bucket is empty instead of negative
        let plan = plan(10, 8, 2, 5);
        let sizes: Vec<u64> = plan.buckets.iter().map(|b| b.count).collect();

        assert_eq!(sizes, vec![2, 6, 0, 5]);
    }

    #[test]
    fn test_oversized_bucket_is_rejected() {
        let targets = PlayCountTargets::new(i64::MAX, 0, 0, 0).normalize();
        let err = BackfillPlan::new(TrackId::new(1), targets, now()).unwrap_err();

        assert!(matches!(err, EncoreError::BackfillTooLarge { .. }));
    }
}
