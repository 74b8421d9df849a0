// Integration tests for the ingestion pipeline and the merge orchestrator,
// with mock engines so no media tooling or network is required.
//
// The mocks count their calls: the idempotency tests assert that gated runs
// perform zero external work.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use lectern::audio::SegmentPlan;
use lectern::config::AudioConfig;
use lectern::{
    ChunkResult, DocumentExtractor, LectureIngestion, LectureNotes, LectureStore,
    LectureTranscript, MediaArtifact, MediaBackend, NoteMerger, NotePipeline, PipelineError,
    PipelineResult, Segment, SpeechToText,
};
use tempfile::TempDir;

// ============================================================================
// Mocks
// ============================================================================

/// Media backend that fabricates artifacts and segment files on disk.
struct FakeMedia {
    duration: f64,
    normalize_calls: AtomicUsize,
}

impl FakeMedia {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            normalize_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl MediaBackend for FakeMedia {
    async fn normalize(
        &self,
        _stream_url: &str,
        lecture_id: &str,
        output_dir: &Path,
    ) -> PipelineResult<MediaArtifact> {
        self.normalize_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{lecture_id}.wav"));
        std::fs::write(&path, b"fake")?;
        Ok(MediaArtifact {
            path,
            sample_rate: 16000,
            channels: 1,
        })
    }

    async fn probe_duration(&self, _path: &Path) -> PipelineResult<f64> {
        Ok(self.duration)
    }

    async fn extract_segment(
        &self,
        _artifact: &MediaArtifact,
        plan: &SegmentPlan,
        output_dir: &Path,
    ) -> PipelineResult<Segment> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("chunk_{:03}.wav", plan.index));
        std::fs::write(&path, b"fake")?;
        Ok(Segment::from_plan(plan, path))
    }
}

/// Transcriber that fails or returns whitespace for chosen call indices.
struct ScriptedTranscriber {
    calls: AtomicUsize,
    fail_at: Option<usize>,
    fatal_at: Option<usize>,
    whitespace_at: Option<usize>,
    always_whitespace: bool,
}

impl ScriptedTranscriber {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_at: None,
            fatal_at: None,
            whitespace_at: None,
            always_whitespace: false,
        }
    }

    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::ok()
        }
    }

    fn fatal_at(index: usize) -> Self {
        Self {
            fatal_at: Some(index),
            ..Self::ok()
        }
    }

    fn whitespace_at(index: usize) -> Self {
        Self {
            whitespace_at: Some(index),
            ..Self::ok()
        }
    }

    fn all_whitespace() -> Self {
        Self {
            always_whitespace: true,
            ..Self::ok()
        }
    }
}

#[async_trait::async_trait]
impl SpeechToText for ScriptedTranscriber {
    async fn transcribe(&self, _segment_path: &Path) -> PipelineResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.always_whitespace || self.whitespace_at == Some(call) {
            return Ok("   \n".to_string());
        }
        if self.fail_at == Some(call) {
            return Err(PipelineError::TranscriptionFailed(format!(
                "engine crashed on call {call}"
            )));
        }
        if self.fatal_at == Some(call) {
            return Err(PipelineError::Io(std::io::Error::other("segment file vanished")));
        }
        Ok(format!("text of segment {call}"))
    }
}

#[derive(Default)]
struct MemoryStore {
    transcripts: Mutex<HashMap<String, LectureTranscript>>,
    notes: Mutex<HashMap<String, LectureNotes>>,
}

#[async_trait::async_trait]
impl LectureStore for MemoryStore {
    async fn find_transcript(&self, lecture_id: &str) -> PipelineResult<Option<LectureTranscript>> {
        Ok(self.transcripts.lock().unwrap().get(lecture_id).cloned())
    }

    async fn upsert_transcript(&self, transcript: &LectureTranscript) -> PipelineResult<()> {
        self.transcripts
            .lock()
            .unwrap()
            .insert(transcript.lecture_id.clone(), transcript.clone());
        Ok(())
    }

    async fn find_notes(&self, lecture_id: &str) -> PipelineResult<Option<LectureNotes>> {
        Ok(self.notes.lock().unwrap().get(lecture_id).cloned())
    }

    async fn upsert_notes(&self, notes: &LectureNotes) -> PipelineResult<()> {
        self.notes
            .lock()
            .unwrap()
            .insert(notes.lecture_id.clone(), notes.clone());
        Ok(())
    }
}

struct StaticExtractor {
    text: String,
    calls: AtomicUsize,
}

impl StaticExtractor {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(&self, _document_url: &str, _lecture_id: &str) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

#[derive(Default)]
struct RecordingMerger {
    calls: AtomicUsize,
    last_secondary: Mutex<Option<String>>,
}

#[async_trait::async_trait]
impl NoteMerger for RecordingMerger {
    async fn merge(
        &self,
        _primary: &str,
        secondary: &str,
        _instructions: &str,
    ) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_secondary.lock().unwrap() = Some(secondary.to_string());
        Ok("MERGED NOTES".to_string())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn audio_config(workdir: &Path) -> AudioConfig {
    AudioConfig {
        workdir: workdir.to_string_lossy().into_owned(),
        chunk_size_secs: 600.0,
        overlap_secs: 5.0,
        max_duration_secs: 5400.0,
        sample_rate: 16000,
        channels: 1,
        ffmpeg_program: "ffmpeg".to_string(),
        ffprobe_program: "ffprobe".to_string(),
    }
}

fn ingestion(
    media: Arc<FakeMedia>,
    transcriber: Arc<ScriptedTranscriber>,
    store: Arc<MemoryStore>,
    workdir: &Path,
) -> LectureIngestion {
    LectureIngestion::new(media, transcriber, store, audio_config(workdir))
}

struct Harness {
    media: Arc<FakeMedia>,
    transcriber: Arc<ScriptedTranscriber>,
    extractor: Arc<StaticExtractor>,
    merger: Arc<RecordingMerger>,
    store: Arc<MemoryStore>,
    pipeline: NotePipeline,
    _workdir: TempDir,
}

fn pipeline(
    duration: f64,
    transcriber: ScriptedTranscriber,
    extractor: StaticExtractor,
) -> Result<Harness> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(duration));
    let transcriber = Arc::new(transcriber);
    let extractor = Arc::new(extractor);
    let merger = Arc::new(RecordingMerger::default());
    let store = Arc::new(MemoryStore::default());

    let ingest = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );
    let pipeline = NotePipeline::new(
        Arc::clone(&extractor) as Arc<dyn DocumentExtractor>,
        Arc::clone(&merger) as Arc<dyn NoteMerger>,
        ingest,
        Arc::clone(&store) as Arc<dyn LectureStore>,
    );

    Ok(Harness {
        media,
        transcriber,
        extractor,
        merger,
        store,
        pipeline,
        _workdir: workdir,
    })
}

// ============================================================================
// Ingestion pipeline
// ============================================================================

#[tokio::test]
async fn test_ingestion_transcribes_all_segments_in_order() -> Result<()> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(1801.0));
    let transcriber = Arc::new(ScriptedTranscriber::ok());
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let report = pipeline.ingest("L1", "https://example.com/master.m3u8").await?;

    assert_eq!(report.total_segments, 4);
    assert_eq!(report.successful_segments, 4);

    let transcript = store.find_transcript("L1").await?.expect("persisted");
    assert_eq!(transcript.total_segments, 4);
    let indices: Vec<usize> = transcript.chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    // Logical boundaries carried through to the persisted chunks.
    assert_eq!(transcript.chunks[3].start_secs, 1800.0);
    assert_eq!(transcript.chunks[3].end_secs, 1801.0);

    Ok(())
}

#[tokio::test]
async fn test_failed_segment_is_dropped_without_aborting() -> Result<()> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(1801.0));
    let transcriber = Arc::new(ScriptedTranscriber::failing_at(2));
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let report = pipeline.ingest("L1", "https://example.com/master.m3u8").await?;

    // The failing segment is an omission, not a fatal error.
    assert_eq!(report.total_segments, 4);
    assert_eq!(report.successful_segments, 3);
    // All segments were still attempted.
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 4);

    let transcript = store.find_transcript("L1").await?.expect("persisted");
    let indices: Vec<usize> = transcript.chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 3]);

    Ok(())
}

#[tokio::test]
async fn test_whitespace_result_is_dropped_silently() -> Result<()> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(1200.0));
    let transcriber = Arc::new(ScriptedTranscriber::whitespace_at(1));
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let report = pipeline.ingest("L1", "https://example.com/master.m3u8").await?;

    assert_eq!(report.total_segments, 2);
    assert_eq!(report.successful_segments, 1);

    Ok(())
}

#[tokio::test]
async fn test_fatal_error_in_transcription_loop_aborts_run() -> Result<()> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(1801.0));
    // Call 1 surfaces an I/O error, which is not a per-segment
    // transcription failure and must abort the run.
    let transcriber = Arc::new(ScriptedTranscriber::fatal_at(1));
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let err = pipeline
        .ingest("L1", "https://example.com/master.m3u8")
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, PipelineError::Io(_)));
    // No later segments were attempted and nothing was persisted.
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
    assert!(store.find_transcript("L1").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_zero_duration_persists_empty_transcript() -> Result<()> {
    let workdir = TempDir::new()?;
    let media = Arc::new(FakeMedia::new(0.0));
    let transcriber = Arc::new(ScriptedTranscriber::ok());
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let report = pipeline.ingest("L1", "https://example.com/master.m3u8").await?;

    assert_eq!(report.total_segments, 0);
    assert_eq!(report.successful_segments, 0);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

    // An empty transcript is still persisted; the caller decides whether
    // that is acceptable.
    let transcript = store.find_transcript("L1").await?.expect("persisted");
    assert!(transcript.chunks.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_probed_duration_is_clamped_to_ceiling() -> Result<()> {
    let workdir = TempDir::new()?;
    // Container claims 2 hours; the ceiling is 5400s → 9 segments, not 12.
    let media = Arc::new(FakeMedia::new(7200.0));
    let transcriber = Arc::new(ScriptedTranscriber::ok());
    let store = Arc::new(MemoryStore::default());

    let pipeline = ingestion(
        Arc::clone(&media),
        Arc::clone(&transcriber),
        Arc::clone(&store),
        workdir.path(),
    );

    let report = pipeline.ingest("L1", "https://example.com/master.m3u8").await?;
    assert_eq!(report.total_segments, 9);

    Ok(())
}

// ============================================================================
// Merge orchestrator
// ============================================================================

#[tokio::test]
async fn test_existing_notes_short_circuit_everything() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("doc"))?;

    h.store
        .upsert_notes(&LectureNotes {
            lecture_id: "L1".to_string(),
            notes: "existing notes".to_string(),
            document_url: None,
            media_url: None,
            generated_at: chrono::Utc::now(),
        })
        .await?;

    let outcome = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await?;

    assert!(outcome.skipped);
    assert_eq!(outcome.lecture_id, "L1");
    assert_eq!(outcome.notes, "existing notes");

    // Zero external calls of any kind.
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.media.normalize_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.merger.calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn test_existing_transcript_skips_ingestion_and_is_reused_verbatim() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("doc"))?;

    h.store
        .upsert_transcript(&LectureTranscript {
            lecture_id: "L1".to_string(),
            chunks: vec![
                ChunkResult {
                    index: 1,
                    start_secs: 600.0,
                    end_secs: 1200.0,
                    text: "second".to_string(),
                },
                ChunkResult {
                    index: 0,
                    start_secs: 0.0,
                    end_secs: 600.0,
                    text: "first".to_string(),
                },
            ],
            total_segments: 2,
            processed_at: chrono::Utc::now(),
        })
        .await?;

    let outcome = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await?;

    assert!(!outcome.skipped);
    assert_eq!(outcome.notes, "MERGED NOTES");

    // No media or speech-to-text work happened.
    assert_eq!(h.media.normalize_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.merger.calls.load(Ordering::SeqCst), 1);

    // Stored chunks were merged in index order regardless of storage order.
    let secondary = h.merger.last_secondary.lock().unwrap().clone().unwrap();
    assert_eq!(secondary, "first\n\nsecond");

    Ok(())
}

#[tokio::test]
async fn test_full_run_persists_notes_with_sources() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("doc"))?;

    let outcome = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await?;

    assert!(!outcome.skipped);

    let stored = h.store.find_notes("L1").await?.expect("notes persisted");
    assert_eq!(stored.notes, "MERGED NOTES");
    assert_eq!(stored.document_url.as_deref(), Some("https://example.com/doc.pdf"));
    assert_eq!(stored.media_url.as_deref(), Some("https://example.com/a.m3u8"));

    Ok(())
}

#[tokio::test]
async fn test_empty_document_text_is_fatal_before_ingestion() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("  \n"))?;

    let err = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyDocumentText));
    assert_eq!(err.stage(), "extract_document");
    assert_eq!(h.media.normalize_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn test_empty_transcript_is_fatal_and_writes_no_notes() -> Result<()> {
    // Document text "X", every segment transcribes to whitespace.
    let h = pipeline(
        1801.0,
        ScriptedTranscriber::all_whitespace(),
        StaticExtractor::new("X"),
    )?;

    let err = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyTranscriptText));
    assert_eq!(h.merger.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.find_notes("L1").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_missing_identifier_gets_generated_fallback() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("doc"))?;

    let outcome = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", None)
        .await?;

    assert!(outcome.lecture_id.starts_with("lecture-"));
    // The generated identifier keys the persisted artifacts.
    assert!(h.store.find_notes(&outcome.lecture_id).await?.is_some());
    assert!(h.store.find_transcript(&outcome.lecture_id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_rerun_after_success_is_skipped() -> Result<()> {
    let h = pipeline(1801.0, ScriptedTranscriber::ok(), StaticExtractor::new("doc"))?;

    let first = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await?;
    assert!(!first.skipped);

    let extractor_calls = h.extractor.calls.load(Ordering::SeqCst);
    let merger_calls = h.merger.calls.load(Ordering::SeqCst);

    let second = h
        .pipeline
        .run("https://example.com/doc.pdf", "https://example.com/a.m3u8", Some("L1".into()))
        .await?;

    assert!(second.skipped);
    assert_eq!(second.notes, first.notes);
    // No additional external work on the second run.
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), extractor_calls);
    assert_eq!(h.merger.calls.load(Ordering::SeqCst), merger_calls);

    Ok(())
}
