use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RunPipelineRequest {
    pub document_url: Option<String>,
    pub media_url: Option<String>,
    /// Optional; a unique identifier is generated when absent.
    pub lecture_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub lecture_id: Option<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Pipeline stage the failure originated from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/pipeline
/// Run the full ingestion + merge pipeline.
pub async fn run_pipeline(
    State(state): State<AppState>,
    Json(req): Json<RunPipelineRequest>,
) -> impl IntoResponse {
    let (Some(document_url), Some(media_url)) = (req.document_url, req.media_url) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Missing required fields",
                "required": ["document_url", "media_url"],
                "optional": ["lecture_id"],
            })),
        )
            .into_response();
    };

    info!("Pipeline requested (lecture_id: {:?})", req.lecture_id);

    match state
        .pipeline
        .run(&document_url, &media_url, req.lecture_id)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!("Pipeline failed at {}: {}", e.stage(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    stage: Some(e.stage()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/notes/:lecture_id
pub async fn get_notes(
    State(state): State<AppState>,
    Path(lecture_id): Path<String>,
) -> impl IntoResponse {
    match state.store.find_notes(&lecture_id).await {
        Ok(Some(notes)) => (StatusCode::OK, Json(notes)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found", "lecture_id": lecture_id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch notes: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    stage: Some(e.stage()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/transcripts/:lecture_id
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(lecture_id): Path<String>,
) -> impl IntoResponse {
    match state.store.find_transcript(&lecture_id).await {
        Ok(Some(transcript)) => (StatusCode::OK, Json(transcript)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found", "lecture_id": lecture_id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch transcript: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    stage: Some(e.stage()),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/cleanup
/// Remove temp files for one lecture, or for everything.
pub async fn cleanup(
    State(state): State<AppState>,
    Json(req): Json<CleanupRequest>,
) -> impl IntoResponse {
    if req.all {
        let report = state.cleaner.cleanup_all();
        return (StatusCode::OK, Json(json!({ "cleaned": "all", "report": report })))
            .into_response();
    }

    let Some(lecture_id) = req.lecture_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Provide body: { \"lecture_id\": \"...\" } or { \"all\": true }"
            })),
        )
            .into_response();
    };

    let report = state.cleaner.cleanup_lecture(&lecture_id);
    (
        StatusCode::OK,
        Json(json!({ "lecture_id": lecture_id, "report": report })),
    )
        .into_response()
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
