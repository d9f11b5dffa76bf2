//! Router construction.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Slack on top of the upload cap so multipart framing overhead never trips
/// the transport-level body limit; the handler owns the real 413.
const BODY_LIMIT_SLACK_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size_bytes + BODY_LIMIT_SLACK_BYTES;

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v0/uploads", post(handlers::uploads::submit_upload))
        .route(
            "/api/v0/uploads/{id}/status",
            get(handlers::uploads::upload_status),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
