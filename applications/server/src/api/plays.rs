/// Play analytics API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use encore_core::{
    BackfillReport, PlayCountTargets, PlayCounts, PlayEvent, TrackId, TrackPlayCounts, Window,
};
use serde::Deserialize;
use serde_json::Value;

/// Parse the `:id` path segment
fn parse_track_id(id: &str) -> Result<TrackId> {
    id.parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid track id: {id}")))
}

/// POST /api/tracks/:id/play
pub async fn record_play(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayEvent>> {
    let track_id = parse_track_id(&id)?;
    let event = app_state.analytics.record_play(track_id).await?;
    Ok(Json(event))
}

/// GET /api/tracks/:id/play-counts
pub async fn get_play_counts(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayCounts>> {
    let track_id = parse_track_id(&id)?;
    let counts = app_state.analytics.snapshot(track_id).await?;
    Ok(Json(counts))
}

/// POST /api/tracks/:id/play-counts
///
/// Body is taken as raw JSON so malformed counts are reported as a 400 with
/// our own message rather than axum's rejection text.
pub async fn set_play_counts(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<BackfillReport>> {
    let track_id = parse_track_id(&id)?;
    let targets = PlayCountTargets::from_json(&body)?;
    let report = app_state
        .analytics
        .set_aggregate_counts(track_id, targets)
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub track_ids: Vec<TrackId>,
    #[serde(default)]
    pub rank_by: Option<Window>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /api/play-counts/batch
///
/// Without `rankBy` the tracks come back in request order. Lists longer than
/// `server.max_batch_tracks` are rejected.
pub async fn batch_play_counts(
    State(app_state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Vec<TrackPlayCounts>>> {
    if request.track_ids.len() > app_state.max_batch_tracks {
        return Err(ServerError::BadRequest(format!(
            "Too many track ids: {} (limit {})",
            request.track_ids.len(),
            app_state.max_batch_tracks
        )));
    }

    let analytics = &app_state.analytics;
    let mut results = match request.rank_by {
        Some(window) => analytics.ranked(&request.track_ids, window, None).await?,
        None => analytics.snapshots(&request.track_ids).await?,
    };
    if let Some(limit) = request.limit {
        results.truncate(limit);
    }
    Ok(Json(results))
}
