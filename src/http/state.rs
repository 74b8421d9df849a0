use std::sync::Arc;

use crate::cleanup::Cleaner;
use crate::pipeline::NotePipeline;
use crate::store::LectureStore;

/// Shared application state for HTTP handlers.
///
/// The pipeline is stateless per run; concurrent requests for different
/// lecture identifiers are independent.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NotePipeline>,
    pub store: Arc<dyn LectureStore>,
    pub cleaner: Arc<Cleaner>,
}
