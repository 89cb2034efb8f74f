//! Windowed play counts
//!
//! Windows trail a single captured instant (`now`) and nest strictly:
//! day ⊂ week ⊂ month ⊂ all-time.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use super::ids::TrackId;
use crate::error::EncoreError;

/// A trailing time window ending at "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Day,
    Week,
    Month,
    All,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::Day, Window::Week, Window::Month, Window::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Day => "day",
            Window::Week => "week",
            Window::Month => "month",
            Window::All => "all",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Window {
    type Err = EncoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Window::Day),
            "week" => Ok(Window::Week),
            "month" => Ok(Window::Month),
            "all" => Ok(Window::All),
            other => Err(EncoreError::invalid_input(format!("Unknown window: {other}"))),
        }
    }
}

/// Window start instants computed from one captured `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBoundaries {
    pub now: DateTime<Utc>,
    pub day: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
}

impl WindowBoundaries {
    /// Compute the boundaries relative to `now`
    ///
    /// The month boundary is one calendar month back, clamped to the last
    /// valid day (31 March -> 28/29 February).
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            day: now - Duration::days(1),
            week: now - Duration::weeks(1),
            month: now
                .checked_sub_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Start of `window`, or `None` for the unbounded all-time window
    pub fn since(&self, window: Window) -> Option<DateTime<Utc>> {
        match window {
            Window::Day => Some(self.day),
            Window::Week => Some(self.week),
            Window::Month => Some(self.month),
            Window::All => None,
        }
    }
}

/// Play counts for the four nested windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayCounts {
    pub all: u64,
    pub month: u64,
    pub week: u64,
    pub day: u64,
}

impl PlayCounts {
    pub const fn new(all: u64, month: u64, week: u64, day: u64) -> Self {
        Self {
            all,
            month,
            week,
            day,
        }
    }

    /// Count for a single window
    pub fn get(&self, window: Window) -> u64 {
        match window {
            Window::Day => self.day,
            Window::Week => self.week,
            Window::Month => self.month,
            Window::All => self.all,
        }
    }

    /// `all >= month >= week >= day`
    pub fn is_nested(&self) -> bool {
        self.all >= self.month && self.month >= self.week && self.week >= self.day
    }

    pub fn is_empty(&self) -> bool {
        self.all == 0
    }
}

impl Add for PlayCounts {
    type Output = PlayCounts;

    fn add(self, rhs: Self) -> Self::Output {
        PlayCounts {
            all: self.all.saturating_add(rhs.all),
            month: self.month.saturating_add(rhs.month),
            week: self.week.saturating_add(rhs.week),
            day: self.day.saturating_add(rhs.day),
        }
    }
}

impl Sum for PlayCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PlayCounts::default(), Add::add)
    }
}

impl<'a> Sum<&'a PlayCounts> for PlayCounts {
    fn sum<I: Iterator<Item = &'a PlayCounts>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Play counts tagged with the track they belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPlayCounts {
    pub track_id: TrackId,
    #[serde(flatten)]
    pub counts: PlayCounts,
}

/// Caller-supplied backfill targets, before sanitizing
///
/// Missing values are `None`. Values are otherwise taken as given; negative
/// and inconsistently nested inputs are repaired by [`PlayCountTargets::normalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCountTargets {
    #[serde(default, alias = "playCountAll")]
    pub all: Option<i64>,
    #[serde(default, alias = "playCountMonth")]
    pub month: Option<i64>,
    #[serde(default, alias = "playCountWeek")]
    pub week: Option<i64>,
    #[serde(default, alias = "playCountDay")]
    pub day: Option<i64>,
}

impl PlayCountTargets {
    pub fn new(all: i64, month: i64, week: i64, day: i64) -> Self {
        Self {
            all: Some(all),
            month: Some(month),
            week: Some(week),
            day: Some(day),
        }
    }

    /// Parse targets from an untyped JSON payload
    ///
    /// Anything other than an object whose count fields are integers or null
    /// is rejected.
    pub fn from_json(value: &serde_json::Value) -> crate::Result<Self> {
        if !value.is_object() {
            return Err(EncoreError::invalid_input(
                "Play counts payload must be a JSON object",
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| EncoreError::invalid_input(format!("Malformed play counts: {e}")))
    }

    /// Sanitize and repair the nesting of the targets
    ///
    /// Missing and negative values become zero, then `all` is raised to the
    /// largest of the four so the outer window is never smaller than an inner
    /// one. Inner windows are left as given.
    pub fn normalize(&self) -> NormalizedTargets {
        let clamp = |v: Option<i64>| v.map_or(0, |v| u64::try_from(v).unwrap_or(0));

        let month = clamp(self.month);
        let week = clamp(self.week);
        let day = clamp(self.day);
        let all = clamp(self.all).max(month).max(week).max(day);

        NormalizedTargets(PlayCounts {
            all,
            month,
            week,
            day,
        })
    }
}

/// Targets after sanitizing: non-negative with `all` as the maximum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTargets(PlayCounts);

impl NormalizedTargets {
    pub fn counts(&self) -> PlayCounts {
        self.0
    }

    pub fn total(&self) -> u64 {
        self.0.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_boundaries_share_one_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let b = WindowBoundaries::at(now);

        assert_eq!(b.day, Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap());
        assert_eq!(b.week, Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap());
        assert_eq!(b.month, Utc.with_ymd_and_hms(2025, 5, 15, 12, 0, 0).unwrap());
        assert_eq!(b.since(Window::All), None);
    }

    #[test]
    fn test_month_boundary_clamps_to_end_of_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 8, 30, 0).unwrap();
        let b = WindowBoundaries::at(now);

        assert_eq!(b.month, Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap());
        assert!(b.month < b.week);
    }

    #[test]
    fn test_normalize_raises_all_to_largest_window() {
        let targets = PlayCountTargets::new(5, 10, 2, 1).normalize();
        assert_eq!(targets.counts(), PlayCounts::new(10, 10, 2, 1));
    }

    #[test]
    fn test_normalize_clamps_negative_and_missing_values() {
        let targets = PlayCountTargets {
            all: Some(4),
            month: None,
            week: Some(2),
            day: Some(-3),
        }
        .normalize();

        assert_eq!(targets.counts(), PlayCounts::new(4, 0, 2, 0));
    }

    #[test]
    fn test_from_json_accepts_integers_and_nulls() {
        let value = serde_json::json!({
            "playCountAll": 100,
            "playCountMonth": 40,
            "playCountWeek": null,
        });
        let targets = PlayCountTargets::from_json(&value).unwrap();

        assert_eq!(targets.all, Some(100));
        assert_eq!(targets.month, Some(40));
        assert_eq!(targets.week, None);
        assert_eq!(targets.day, None);
    }

    #[test]
    fn test_from_json_rejects_non_integers() {
        for bad in [
            serde_json::json!({ "playCountAll": "many" }),
            serde_json::json!({ "playCountDay": 1.5 }),
            serde_json::json!({ "playCountWeek": [1] }),
            serde_json::json!([1, 2, 3]),
            serde_json::json!("100"),
        ] {
            let err = PlayCountTargets::from_json(&bad).unwrap_err();
            assert!(err.is_client_error(), "{bad} should be a client error");
        }
    }

    #[test]
    fn test_counts_sum_per_window() {
        let total: PlayCounts = [PlayCounts::new(3, 2, 1, 0), PlayCounts::new(10, 5, 5, 1)]
            .iter()
            .sum();
        assert_eq!(total, PlayCounts::new(13, 7, 6, 1));
        assert_eq!(total.get(Window::Week), 6);
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("Week".parse::<Window>().unwrap(), Window::Week);
        assert!("year".parse::<Window>().is_err());
    }
}
