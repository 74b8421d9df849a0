use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of transcribing one segment. A segment that failed or produced
/// only whitespace yields no `ChunkResult` at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Segment index within the lecture (0-based).
    pub index: usize,
    /// Logical start time in seconds.
    pub start_secs: f64,
    /// Logical end time in seconds (overlap not counted).
    pub end_secs: f64,
    /// Transcribed text, non-empty.
    pub text: String,
}

/// Ordered aggregation of all successful chunks for one lecture.
///
/// Upserted wholesale after each full ingestion run; never partially
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureTranscript {
    pub lecture_id: String,
    /// Successful chunks, sorted by index.
    pub chunks: Vec<ChunkResult>,
    /// Segments attempted, including dropped ones.
    pub total_segments: usize,
    pub processed_at: DateTime<Utc>,
}

impl LectureTranscript {
    pub fn successful_segments(&self) -> usize {
        self.chunks.len()
    }

    /// All chunk text in index order, blank-line separated. Sorts
    /// defensively rather than trusting insertion order.
    pub fn merged_text(&self) -> String {
        let mut chunks: Vec<&ChunkResult> = self.chunks.iter().collect();
        chunks.sort_by_key(|c| c.index);
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Final merged note set for one lecture. Existing non-empty notes are
/// terminal: the orchestrator never regenerates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureNotes {
    pub lecture_id: String,
    pub notes: String,
    pub document_url: Option<String>,
    pub media_url: Option<String>,
    pub generated_at: DateTime<Utc>,
}
