//! Persistence of derived lecture artifacts, keyed by lecture identifier.

pub mod db;
pub mod models;

pub use db::SledStore;
pub use models::{ChunkResult, LectureNotes, LectureTranscript};

use crate::error::PipelineResult;

/// Keyed upsert/find for transcripts and notes.
///
/// "Not found" is `Ok(None)`, distinct from store failures. Upserts replace
/// the whole document for the key, which is what makes pipeline re-runs
/// idempotent.
#[async_trait::async_trait]
pub trait LectureStore: Send + Sync {
    async fn find_transcript(&self, lecture_id: &str) -> PipelineResult<Option<LectureTranscript>>;

    async fn upsert_transcript(&self, transcript: &LectureTranscript) -> PipelineResult<()>;

    async fn find_notes(&self, lecture_id: &str) -> PipelineResult<Option<LectureNotes>>;

    async fn upsert_notes(&self, notes: &LectureNotes) -> PipelineResult<()>;
}
