use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::{MediaBackend, Partitioner};
use crate::config::AudioConfig;
use crate::engines::SpeechToText;
use crate::error::PipelineResult;
use crate::store::{ChunkResult, LectureStore, LectureTranscript};

/// Result of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub lecture_id: String,
    /// Segments planned and attempted.
    pub total_segments: usize,
    /// Segments that produced non-empty text.
    pub successful_segments: usize,
}

/// The chunked-transcription ingestion pipeline for a single lecture:
/// normalize, probe, partition, transcribe each segment, aggregate, persist.
///
/// Stages run strictly sequentially. Segment transcription is also
/// sequential: the external engine is assumed single-capacity.
pub struct LectureIngestion {
    media: Arc<dyn MediaBackend>,
    transcriber: Arc<dyn SpeechToText>,
    store: Arc<dyn LectureStore>,
    audio: AudioConfig,
}

impl LectureIngestion {
    pub fn new(
        media: Arc<dyn MediaBackend>,
        transcriber: Arc<dyn SpeechToText>,
        store: Arc<dyn LectureStore>,
        audio: AudioConfig,
    ) -> Self {
        Self {
            media,
            transcriber,
            store,
            audio,
        }
    }

    /// Run the full ingestion for one lecture and upsert its transcript.
    ///
    /// Normalization, probing, and partitioning failures are fatal and
    /// nothing is persisted. Per-segment transcription failures are logged
    /// and dropped; a run with zero successful segments still persists an
    /// empty transcript.
    pub async fn ingest(&self, lecture_id: &str, media_url: &str) -> PipelineResult<IngestReport> {
        info!("Ingesting lecture {}", lecture_id);

        let workdir = PathBuf::from(&self.audio.workdir);

        let artifact = self.media.normalize(media_url, lecture_id, &workdir).await?;

        let probed = self.media.probe_duration(&artifact.path).await?;
        // The artifact was already truncated at encode time; clamping again
        // keeps a lying container from inflating the segment count.
        let total_duration = probed.min(self.audio.max_duration_secs);
        info!("Audio duration: {:.1}s", total_duration);

        let chunks_dir = workdir.join("chunks").join(lecture_id);
        let partitioner = Partitioner::new(
            self.media.as_ref(),
            self.audio.chunk_size_secs,
            self.audio.overlap_secs,
        );
        let segments = partitioner
            .partition(&artifact, total_duration, &chunks_dir)
            .await?;

        // Best-effort transcription: collect one Result per segment, then
        // keep the successes. One corrupted chunk must not sink the lecture.
        let mut outcomes: Vec<PipelineResult<ChunkResult>> = Vec::with_capacity(segments.len());
        for segment in &segments {
            info!("Transcribing segment {}/{}", segment.index + 1, segments.len());

            match self.transcriber.transcribe(&segment.path).await {
                Ok(text) if !text.trim().is_empty() => outcomes.push(Ok(ChunkResult {
                    index: segment.index,
                    start_secs: segment.start_secs,
                    end_secs: segment.end_secs,
                    text: text.trim().to_string(),
                })),
                Ok(_) => {
                    warn!("Segment {} produced empty text, dropping", segment.index);
                }
                // Only per-segment transcription failures are swallowed;
                // anything else in the taxonomy aborts the run.
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Segment {} failed, continuing: {}", segment.index, e);
                    outcomes.push(Err(e));
                }
            }
        }

        let mut chunks: Vec<ChunkResult> = outcomes.into_iter().filter_map(Result::ok).collect();
        // Sequential processing already yields index order, but aggregation
        // must not depend on that.
        chunks.sort_by_key(|c| c.index);

        let transcript = LectureTranscript {
            lecture_id: lecture_id.to_string(),
            chunks,
            total_segments: segments.len(),
            processed_at: Utc::now(),
        };

        self.store.upsert_transcript(&transcript).await?;

        info!(
            "Ingestion complete for {}: {}/{} segments transcribed",
            lecture_id,
            transcript.successful_segments(),
            transcript.total_segments
        );

        Ok(IngestReport {
            lecture_id: lecture_id.to_string(),
            total_segments: transcript.total_segments,
            successful_segments: transcript.successful_segments(),
        })
    }
}
