//! Plain-text export of a stored transcript, with size statistics.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::store::{LectureStore, LectureTranscript};

#[derive(Debug)]
pub struct ExportStats {
    pub characters: usize,
    pub words: usize,
    /// Rough estimate: one token per four characters.
    pub approx_tokens: usize,
}

pub fn transcript_stats(text: &str) -> ExportStats {
    ExportStats {
        characters: text.len(),
        words: text.split_whitespace().count(),
        approx_tokens: text.len().div_ceil(4),
    }
}

fn render(transcript: &LectureTranscript) -> String {
    let merged = transcript.merged_text();
    let stats = transcript_stats(&merged);
    let rule = "=".repeat(80);

    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Lecture: {}", transcript.lecture_id);
    let _ = writeln!(
        out,
        "Chunks: {}/{}",
        transcript.successful_segments(),
        transcript.total_segments
    );
    let _ = writeln!(out, "Processed At: {}", transcript.processed_at);
    let _ = writeln!(
        out,
        "Characters: {} | Words: {} | Tokens: {}",
        stats.characters, stats.words, stats.approx_tokens
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    out.push_str(&merged);
    out.push('\n');
    out
}

/// Write the merged transcript for `lecture_id` to `out_path`.
pub async fn export_transcript(
    store: &dyn LectureStore,
    lecture_id: &str,
    out_path: &Path,
) -> Result<ExportStats> {
    let transcript = store
        .find_transcript(lecture_id)
        .await
        .with_context(|| format!("failed to read transcript for {lecture_id}"))?;

    let Some(transcript) = transcript else {
        bail!("no transcript found for lecture {lecture_id}");
    };

    let merged = transcript.merged_text();
    let stats = transcript_stats(&merged);

    tokio::fs::write(out_path, render(&transcript))
        .await
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    Ok(stats)
}
