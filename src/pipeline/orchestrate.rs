use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::ingest::LectureIngestion;
use crate::engines::{DocumentExtractor, NoteMerger};
use crate::error::{PipelineError, PipelineResult};
use crate::store::{LectureNotes, LectureStore};

/// Instructions handed to the merge engine: the document is authoritative,
/// the transcript only reinforces it.
pub const NOTE_MERGE_PROMPT: &str = "\
You are an academic note generation engine.

INPUTS:
- A lecture PDF (authoritative source of syllabus, structure, and definitions).
- A cleaned lecture transcript (secondary source with speaker emphasis).

AUTHORITY RULES (MANDATORY):
1. The PDF is the single source of truth for topics, structure, definitions, and scope.
2. The transcript may only emphasize importance, clarify existing PDF concepts, or add exam-oriented hints explicitly stated by the speaker.
3. If the transcript introduces a topic not present in the PDF, ignore it.
4. If the transcript contradicts the PDF, ignore the transcript.
5. Do not invent topics, examples, definitions, steps, or syllabus structure.

STRUCTURE RULES:
- Follow the PDF's section order exactly; no new headings; no reordering.
- Each output section must correspond to a PDF section.

STYLE RULES:
- Clean, concise, exam-oriented academic notes.
- No conversational tone and no references to the recording or the speaker.

OUTPUT:
Structured notes strictly aligned to the PDF, enhanced only where the transcript explicitly adds value.";

/// Final result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub lecture_id: String,
    pub notes: String,
    /// True when existing notes were returned without re-running anything.
    pub skipped: bool,
    pub generated_at: DateTime<Utc>,
}

/// Composes document extraction, lecture ingestion, and note merging, with
/// two idempotency gates guarding the expensive external calls.
pub struct NotePipeline {
    extractor: Arc<dyn DocumentExtractor>,
    merger: Arc<dyn NoteMerger>,
    ingestion: LectureIngestion,
    store: Arc<dyn LectureStore>,
}

impl NotePipeline {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        merger: Arc<dyn NoteMerger>,
        ingestion: LectureIngestion,
        store: Arc<dyn LectureStore>,
    ) -> Self {
        Self {
            extractor,
            merger,
            ingestion,
            store,
        }
    }

    /// Run the full pipeline for one lecture.
    ///
    /// When `lecture_id` is omitted a unique fallback is generated and
    /// returned; whichever identifier is used keys every persisted entity.
    pub async fn run(
        &self,
        document_url: &str,
        media_url: &str,
        lecture_id: Option<String>,
    ) -> PipelineResult<PipelineOutcome> {
        let lecture_id =
            lecture_id.unwrap_or_else(|| format!("lecture-{}", uuid::Uuid::new_v4()));

        // Gate 1: existing non-empty notes are terminal.
        if let Some(existing) = self.store.find_notes(&lecture_id).await? {
            if !existing.notes.trim().is_empty() {
                info!("Lecture {} already has notes, skipping pipeline", lecture_id);
                return Ok(PipelineOutcome {
                    lecture_id,
                    notes: existing.notes,
                    skipped: true,
                    generated_at: existing.generated_at,
                });
            }
        }

        info!("Starting pipeline for lecture {}", lecture_id);

        let document_text = self.extractor.extract(document_url, &lecture_id).await?;
        if document_text.trim().is_empty() {
            return Err(PipelineError::EmptyDocumentText);
        }
        info!("Extracted {} characters from document", document_text.len());

        // Gate 2: a transcript with at least one chunk is reused verbatim.
        match self.store.find_transcript(&lecture_id).await? {
            Some(existing) if !existing.chunks.is_empty() => {
                info!(
                    "Lecture {} already transcribed ({} chunks), skipping ingestion",
                    lecture_id,
                    existing.chunks.len()
                );
            }
            _ => {
                let report = self.ingestion.ingest(&lecture_id, media_url).await?;
                info!(
                    "Ingested {}/{} segments",
                    report.successful_segments, report.total_segments
                );
            }
        }

        let transcript_text = self
            .store
            .find_transcript(&lecture_id)
            .await?
            .map(|t| t.merged_text())
            .unwrap_or_default();
        if transcript_text.trim().is_empty() {
            return Err(PipelineError::EmptyTranscriptText);
        }
        info!("Transcript has {} characters", transcript_text.len());

        let notes = self
            .merger
            .merge(&document_text, &transcript_text, NOTE_MERGE_PROMPT)
            .await?;

        let generated_at = Utc::now();
        self.store
            .upsert_notes(&LectureNotes {
                lecture_id: lecture_id.clone(),
                notes: notes.clone(),
                document_url: Some(document_url.to_string()),
                media_url: Some(media_url.to_string()),
                generated_at,
            })
            .await?;

        info!("Notes saved for lecture {}", lecture_id);

        Ok(PipelineOutcome {
            lecture_id,
            notes,
            skipped: false,
            generated_at,
        })
    }
}
