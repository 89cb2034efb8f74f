/// Common test utilities and fixtures
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use encore_core::{ManualClock, PlayAnalytics};
use encore_server::{create_router, state::AppState};
use encore_storage::SqlitePlayStore;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

/// Router plus the pieces tests poke at directly
pub struct TestApp {
    pub router: Router,
    pub analytics: Arc<PlayAnalytics>,
    pub clock: Arc<ManualClock>,
    _temp_dir: TempDir,
}

/// Fixed instant every test starts from
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// Create a test app over a fresh SQLite file with migrations applied
pub async fn create_test_app() -> Result<TestApp> {
    create_test_app_with_batch_cap(encore_server::state::DEFAULT_MAX_BATCH_TRACKS).await
}

/// Same as [`create_test_app`] with a custom batch track cap
pub async fn create_test_app_with_batch_cap(max_batch_tracks: usize) -> Result<TestApp> {
    let temp_dir = TempDir::new()?;
    let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

    let pool = encore_storage::create_pool(&db_url).await?;
    encore_storage::run_migrations(&pool).await?;

    let clock = Arc::new(ManualClock::new(reference_now()));
    let analytics = Arc::new(PlayAnalytics::new(
        Arc::new(SqlitePlayStore::new(pool).with_batch_size(64)),
        clock.clone(),
    ));

    Ok(TestApp {
        router: create_router(
            AppState::new(Arc::clone(&analytics)).with_max_batch_tracks(max_batch_tracks),
        ),
        analytics,
        clock,
        _temp_dir: temp_dir,
    })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
