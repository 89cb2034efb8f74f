//! Play events vertical slice
//!
//! All queries for the `play_events` table. Timestamps are stored as
//! microseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use encore_core::{
    error::Result, storage::ensure_single_track, NewPlayEvent, PlayCounts, PlayEvent,
    PlayEventId, ReplaceOutcome, TrackId, WindowBoundaries,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::error::StorageError;

/// Rows per multi-row INSERT when the caller does not choose
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Largest batch that stays under `SQLite`'s bound-parameter limit
pub const MAX_BATCH_SIZE: usize = 16_000;

/// Record a single play
pub async fn append(pool: &SqlitePool, event: NewPlayEvent) -> Result<PlayEvent> {
    let result = sqlx::query("INSERT INTO play_events (track_id, played_at) VALUES (?, ?)")
        .bind(event.track_id)
        .bind(event.played_at.timestamp_micros())
        .execute(pool)
        .await?;

    Ok(event.with_id(PlayEventId::new(result.last_insert_rowid())))
}

/// Delete every play of a track
pub async fn delete_all(pool: &SqlitePool, track_id: TrackId) -> Result<u64> {
    let result = sqlx::query("DELETE FROM play_events WHERE track_id = ?")
        .bind(track_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a batch of plays in one transaction
pub async fn insert_many(
    pool: &SqlitePool,
    events: &[NewPlayEvent],
    batch_size: usize,
) -> Result<u64> {
    if events.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let inserted = insert_batches(&mut tx, events, batch_size).await?;
    tx.commit().await?;

    Ok(inserted)
}

/// Replace a track's plays with `events` in one transaction
///
/// The transaction rolls back when dropped uncommitted, so a failed insert
/// leaves the previous plays in place.
pub async fn replace_all(
    pool: &SqlitePool,
    track_id: TrackId,
    events: &[NewPlayEvent],
    batch_size: usize,
) -> Result<ReplaceOutcome> {
    ensure_single_track(track_id, events)?;

    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM play_events WHERE track_id = ?")
        .bind(track_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let inserted = insert_batches(&mut tx, events, batch_size).await?;

    tx.commit().await?;

    tracing::debug!(track_id = %track_id, deleted, inserted, "Replaced play history");
    Ok(ReplaceOutcome { deleted, inserted })
}

/// Count plays at or after `since`
pub async fn count_since(
    pool: &SqlitePool,
    track_id: TrackId,
    since: DateTime<Utc>,
) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM play_events WHERE track_id = ? AND played_at >= ?",
    )
    .bind(track_id)
    .bind(since.timestamp_micros())
    .fetch_one(pool)
    .await?;

    Ok(count.unsigned_abs())
}

/// Count every play of a track
pub async fn count_all(pool: &SqlitePool, track_id: TrackId) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM play_events WHERE track_id = ?")
        .bind(track_id)
        .fetch_one(pool)
        .await?;

    Ok(count.unsigned_abs())
}

/// Counts for every window from a single statement
///
/// One SELECT reads one snapshot of the table, so a concurrent write cannot
/// make a narrower window larger than a wider one.
pub async fn window_counts(
    pool: &SqlitePool,
    track_id: TrackId,
    boundaries: &WindowBoundaries,
) -> Result<PlayCounts> {
    let (all, month, week, day): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*),
                COALESCE(SUM(played_at >= ?), 0),
                COALESCE(SUM(played_at >= ?), 0),
                COALESCE(SUM(played_at >= ?), 0)
         FROM play_events
         WHERE track_id = ?",
    )
    .bind(boundaries.month.timestamp_micros())
    .bind(boundaries.week.timestamp_micros())
    .bind(boundaries.day.timestamp_micros())
    .bind(track_id)
    .fetch_one(pool)
    .await?;

    Ok(PlayCounts {
        all: all.unsigned_abs(),
        month: month.unsigned_abs(),
        week: week.unsigned_abs(),
        day: day.unsigned_abs(),
    })
}

/// All plays of a track, oldest first
pub async fn get_by_track(pool: &SqlitePool, track_id: TrackId) -> Result<Vec<PlayEvent>> {
    let rows: Vec<(PlayEventId, TrackId, i64)> = sqlx::query_as(
        "SELECT id, track_id, played_at FROM play_events
         WHERE track_id = ?
         ORDER BY played_at, id",
    )
    .bind(track_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, track_id, played_at)| {
            Ok(PlayEvent {
                id,
                track_id,
                played_at: from_micros(played_at)?,
            })
        })
        .collect()
}

// Helper functions

async fn insert_batches(
    conn: &mut SqliteConnection,
    events: &[NewPlayEvent],
    batch_size: usize,
) -> Result<u64> {
    let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
    let mut inserted = 0;

    for chunk in events.chunks(batch_size) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO play_events (track_id, played_at) ");
        builder.push_values(chunk, |mut row, event| {
            row.push_bind(event.track_id)
                .push_bind(event.played_at.timestamp_micros());
        });

        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(inserted)
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| {
        StorageError::corrupt_row("play_events", format!("Invalid timestamp: {micros}")).into()
    })
}
