//! Pipeline orchestration
//!
//! `ingest` runs the chunked-transcription stages for one lecture;
//! `orchestrate` composes document extraction, ingestion, and note merging
//! behind the two idempotency gates.

pub mod ingest;
pub mod orchestrate;

pub use ingest::{IngestReport, LectureIngestion};
pub use orchestrate::{NotePipeline, PipelineOutcome, NOTE_MERGE_PROMPT};
