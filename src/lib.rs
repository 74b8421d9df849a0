pub mod audio;
pub mod cleanup;
pub mod config;
pub mod engines;
pub mod error;
pub mod export;
pub mod http;
pub mod pipeline;
pub mod store;

pub use audio::{
    plan_segments, FfmpegBackend, MediaArtifact, MediaBackend, Partitioner, Segment, SegmentPlan,
};
pub use cleanup::Cleaner;
pub use config::Config;
pub use engines::{
    CommandExtractor, CommandTranscriber, DocumentExtractor, NoteMerger, OpenRouterMerger,
    SpeechToText,
};
pub use error::{PipelineError, PipelineResult};
pub use http::{create_router, AppState};
pub use pipeline::{IngestReport, LectureIngestion, NotePipeline, PipelineOutcome};
pub use store::{ChunkResult, LectureNotes, LectureStore, LectureTranscript, SledStore};
