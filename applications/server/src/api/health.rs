/// Health check API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use encore_core::TrackId;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// The instant window boundaries are currently computed from
    pub now: DateTime<Utc>,
}

/// GET /api/health
///
/// Touches the store with a cheap count so a broken database shows up here.
pub async fn health(State(app_state): State<AppState>) -> Result<Json<HealthResponse>> {
    app_state
        .analytics
        .store()
        .count_all(TrackId::new(0))
        .await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        now: app_state.analytics.clock().now(),
    }))
}
