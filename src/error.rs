use thiserror::Error;

/// Failure taxonomy for the ingestion + merge pipeline.
///
/// Everything here is fatal to the current run except
/// [`PipelineError::TranscriptionFailed`], which is isolated per segment by
/// the ingestion loop: the failing chunk is dropped and the run continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The media stream could not be opened or reconnected.
    #[error("media source unavailable: {0}")]
    SourceUnavailable(String),

    /// ffmpeg accepted the input but transcoding failed.
    #[error("audio normalization failed: {0}")]
    NormalizationFailed(String),

    /// ffprobe could not read the normalized artifact.
    #[error("duration probe failed: {0}")]
    ProbeFailed(String),

    /// The speech-to-text engine failed for one segment.
    #[error("segment transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Document download or text extraction failed.
    #[error("document extraction failed: {0}")]
    ExtractionFailed(String),

    /// The document extractor returned only whitespace.
    #[error("document produced no text")]
    EmptyDocumentText,

    /// No transcript text was available after skip-or-ingest.
    #[error("lecture transcript is empty")]
    EmptyTranscriptText,

    /// The note-merge engine call failed.
    #[error("note merge failed: {0}")]
    MergeFailed(String),

    /// Persistence read/write failed (distinct from "not found").
    #[error("store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Label of the pipeline stage this error originates from, for
    /// caller-facing failure reports.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) | Self::NormalizationFailed(_) => "normalize",
            Self::ProbeFailed(_) => "probe",
            Self::TranscriptionFailed(_) => "transcribe",
            Self::ExtractionFailed(_) | Self::EmptyDocumentText => "extract_document",
            Self::EmptyTranscriptText => "fetch_transcript",
            Self::MergeFailed(_) => "merge",
            Self::Store(_) => "persist",
            Self::Io(_) => "io",
        }
    }

    /// Whether this failure aborts the whole run. Only per-segment
    /// transcription failures are recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TranscriptionFailed(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
