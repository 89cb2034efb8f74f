//! Encore Server Library
//!
//! HTTP adapter over the play analytics service: record plays, read
//! windowed counts, and backfill a track's history from aggregate counts.
//!
//! This library exposes the router and its components for the binary and
//! for integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;

/// Build the application router with all `/api` routes mounted
pub fn create_router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(api::health::health))
        .route("/tracks/:id/play", post(api::plays::record_play))
        .route(
            "/tracks/:id/play-counts",
            get(api::plays::get_play_counts).post(api::plays::set_play_counts),
        )
        .route("/play-counts/batch", post(api::plays::batch_play_counts));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
