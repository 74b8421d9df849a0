//! External engine seams: document OCR, speech-to-text, and note merging.
//!
//! The pipeline is agnostic to how each capability is implemented
//! (subprocess, remote service, in-process model); it only depends on these
//! traits.

pub mod command;
pub mod openrouter;

use std::path::Path;

use crate::error::PipelineResult;

/// Document text extraction: URL in, plain text out.
#[async_trait::async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, document_url: &str, lecture_id: &str) -> PipelineResult<String>;
}

/// Speech-to-text over one self-contained audio segment.
#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, segment_path: &Path) -> PipelineResult<String>;
}

/// Merge a primary (authoritative) and secondary text into one note set
/// under the given instructions.
#[async_trait::async_trait]
pub trait NoteMerger: Send + Sync {
    async fn merge(
        &self,
        primary: &str,
        secondary: &str,
        instructions: &str,
    ) -> PipelineResult<String>;
}

pub use command::{CommandExtractor, CommandTranscriber};
pub use openrouter::OpenRouterMerger;
