//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create test databases using REAL SQLite files (NOT in-memory)
//! to match production behavior and properly test migrations, constraints, and indexes.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use encore_core::{NewPlayEvent, TrackId};
use encore_storage::SqlitePlayStore;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let pool = encore_storage::create_pool(&db_url)
            .await
            .expect("Failed to create pool");

        encore_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Play store over this database
    pub fn store(&self) -> SqlitePlayStore {
        SqlitePlayStore::new(self.pool.clone())
    }
}

/// Fixed reference instant used across tests
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// Test fixture: a play `minutes` before the reference instant
pub fn play_minutes_ago(track_id: i64, minutes: i64) -> NewPlayEvent {
    NewPlayEvent::new(
        TrackId::new(track_id),
        reference_now() - Duration::minutes(minutes),
    )
}

/// Test fixture: insert plays directly with raw SQL
pub async fn insert_raw_play(pool: &SqlitePool, track_id: i64, played_at_micros: i64) {
    sqlx::query("INSERT INTO play_events (track_id, played_at) VALUES (?, ?)")
        .bind(track_id)
        .bind(played_at_micros)
        .execute(pool)
        .await
        .expect("Failed to insert raw play");
}

/// Count rows for a track with raw SQL
pub async fn raw_count(pool: &SqlitePool, track_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM play_events WHERE track_id = ?")
        .bind(track_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count plays")
}
