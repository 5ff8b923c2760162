//! Solace server library logic.
//!
//! A thin transport layer over the turn pipeline: one endpoint decodes the
//! request into a [`solace_types::TurnRequest`] and serializes the result,
//! one serves stored reply audio, one reports health. All branching logic
//! lives in `solace-turn`.

pub mod api;
pub mod api_download;
pub mod api_turn;
pub mod config;
pub mod retention;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use solace_turn::TurnPipeline;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Request body cap. Above the validator's own bound so oversized uploads
/// reach the pipeline and get the contractual rejection message instead of
/// a bare 413.
const BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Application state shared across all request handlers.
pub struct AppState {
    /// The turn-processing pipeline.
    pub pipeline: Arc<TurnPipeline>,
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version. Used by load balancers,
/// monitoring, and CI to verify the server is running.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the application router with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/therapy", post(api_turn::therapy_handler))
        .route("/download/{filename}", get(api_download::download_handler))
        .route("/health", get(health))
        .layer(Extension(state))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
