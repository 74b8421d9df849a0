use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Pipeline execution
        .route("/api/pipeline", post(handlers::run_pipeline))
        // Stored artifacts
        .route("/api/notes/:lecture_id", get(handlers::get_notes))
        .route(
            "/api/transcripts/:lecture_id",
            get(handlers::get_transcript),
        )
        // Temp file cleanup
        .route("/api/cleanup", post(handlers::cleanup))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
