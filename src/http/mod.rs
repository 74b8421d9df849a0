//! HTTP API for running the pipeline and fetching stored results:
//! - POST /api/pipeline - run the full pipeline (document + media → notes)
//! - GET  /api/notes/:lecture_id - stored notes
//! - GET  /api/transcripts/:lecture_id - stored transcript
//! - POST /api/cleanup - remove temp files
//! - GET  /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
