use std::path::{Path, PathBuf};

use tracing::info;

use super::backend::{MediaArtifact, MediaBackend};
use crate::error::PipelineResult;

/// A planned slice of a normalized artifact, before any audio is cut.
///
/// Consecutive plans advance by exactly the chunk size, so `end_secs` of
/// plan `i` equals `start_secs` of plan `i+1`: logical coverage has no gaps
/// and no double counting. `decode_secs` may extend past `end_secs` by the
/// overlap, so words straddling a cut appear in both physical chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    /// 0-based, contiguous.
    pub index: usize,
    pub start_secs: f64,
    /// Logical end, exclusive of overlap.
    pub end_secs: f64,
    /// Actual decode window, including trailing overlap.
    pub decode_secs: f64,
}

/// A cut segment on disk, ready for transcription.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub decode_secs: f64,
    pub path: PathBuf,
}

impl Segment {
    pub fn from_plan(plan: &SegmentPlan, path: PathBuf) -> Self {
        Self {
            index: plan.index,
            start_secs: plan.start_secs,
            end_secs: plan.end_secs,
            decode_secs: plan.decode_secs,
            path,
        }
    }
}

/// Plan fixed-size segments with trailing overlap across `[0, total_duration)`.
///
/// `total_duration <= 0` plans nothing. The last segment's decode window is
/// clamped to the remaining audio.
pub fn plan_segments(total_duration: f64, chunk_size: f64, overlap: f64) -> Vec<SegmentPlan> {
    let mut plans = Vec::new();

    if total_duration <= 0.0 || chunk_size <= 0.0 {
        return plans;
    }

    let mut start = 0.0;
    let mut index = 0;

    while start < total_duration {
        plans.push(SegmentPlan {
            index,
            start_secs: start,
            end_secs: (start + chunk_size).min(total_duration),
            decode_secs: (chunk_size + overlap).min(total_duration - start),
        });

        start += chunk_size;
        index += 1;
    }

    plans
}

/// Splits a bounded artifact into overlapping, independently decodable
/// segment files under one directory.
pub struct Partitioner<'a> {
    backend: &'a dyn MediaBackend,
    chunk_size: f64,
    overlap: f64,
}

impl<'a> Partitioner<'a> {
    pub fn new(backend: &'a dyn MediaBackend, chunk_size: f64, overlap: f64) -> Self {
        Self {
            backend,
            chunk_size,
            overlap,
        }
    }

    /// Cut every planned segment. Any cut failure is fatal: a partial
    /// segment set would silently lose coverage.
    pub async fn partition(
        &self,
        artifact: &MediaArtifact,
        total_duration: f64,
        output_dir: &Path,
    ) -> PipelineResult<Vec<Segment>> {
        let plans = plan_segments(total_duration, self.chunk_size, self.overlap);

        info!(
            "Partitioning {:.1}s of audio into {} segments ({}s + {}s overlap)",
            total_duration,
            plans.len(),
            self.chunk_size,
            self.overlap
        );

        let mut segments = Vec::with_capacity(plans.len());
        for plan in &plans {
            let segment = self.backend.extract_segment(artifact, plan, output_dir).await?;
            segments.push(segment);
        }

        Ok(segments)
    }
}
