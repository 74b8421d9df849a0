use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::ffmpeg::{self, ToolError};
use super::partition::{Segment, SegmentPlan};
use crate::config::AudioConfig;
use crate::error::{PipelineError, PipelineResult};

/// A normalized audio artifact: mono, 16kHz, 16-bit PCM WAV with a bounded
/// duration. Created once by `normalize` and never mutated afterward.
#[derive(Debug, Clone)]
pub struct MediaArtifact {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Media processing backend
///
/// One production implementation ([`FfmpegBackend`]) drives ffmpeg/ffprobe
/// subprocesses; tests substitute fakes so pipeline behavior can be verified
/// without media tooling installed.
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Fetch a remote stream and produce a single bounded, normalized
    /// mono/16kHz/PCM artifact at `<output_dir>/<lecture_id>.wav`.
    async fn normalize(
        &self,
        stream_url: &str,
        lecture_id: &str,
        output_dir: &Path,
    ) -> PipelineResult<MediaArtifact>;

    /// Duration of the artifact in seconds. Returns 0 (not an error) when
    /// the file is readable but carries no duration metadata.
    async fn probe_duration(&self, path: &Path) -> PipelineResult<f64>;

    /// Cut one planned segment out of the artifact as a self-contained,
    /// independently decodable WAV file.
    async fn extract_segment(
        &self,
        artifact: &MediaArtifact,
        plan: &SegmentPlan,
        output_dir: &Path,
    ) -> PipelineResult<Segment>;
}

/// ffmpeg/ffprobe-backed media processing.
pub struct FfmpegBackend {
    config: AudioConfig,
}

/// Leading-silence trim, loudness normalization, and a short fade-in so
/// segment boundaries don't start with a click.
const NORMALIZE_FILTERS: &str = "silenceremove=start_periods=1:start_threshold=-45dB:start_silence=1.0,\
loudnorm=I=-16:TP=-1.5:LRA=11,\
afade=t=in:ss=0:d=0.05";

impl FfmpegBackend {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Output options shared by normalization and segment cutting: the fixed
    /// target profile plus metadata strip and zero-origin timestamps.
    fn target_profile_args(&self) -> Vec<String> {
        vec![
            "-ac".into(),
            self.config.channels.to_string(),
            "-ar".into(),
            self.config.sample_rate.to_string(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-map_metadata".into(),
            "-1".into(),
            "-reset_timestamps".into(),
            "1".into(),
            "-fflags".into(),
            "+bitexact".into(),
            "-f".into(),
            "wav".into(),
        ]
    }

    /// Confirm the produced WAV actually carries the target profile.
    fn verify_artifact(&self, path: &Path) -> PipelineResult<()> {
        let reader = hound::WavReader::open(path).map_err(|e| {
            PipelineError::NormalizationFailed(format!(
                "artifact unreadable at {}: {e}",
                path.display()
            ))
        })?;
        let spec = reader.spec();
        if spec.sample_rate != self.config.sample_rate || spec.channels != self.config.channels {
            return Err(PipelineError::NormalizationFailed(format!(
                "artifact has {}Hz/{}ch, expected {}Hz/{}ch",
                spec.sample_rate, spec.channels, self.config.sample_rate, self.config.channels
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaBackend for FfmpegBackend {
    async fn normalize(
        &self,
        stream_url: &str,
        lecture_id: &str,
        output_dir: &Path,
    ) -> PipelineResult<MediaArtifact> {
        fs::create_dir_all(output_dir)?;
        let output_path = output_dir.join(format!("{lecture_id}.wav"));

        info!("Normalizing media stream for lecture {}", lecture_id);

        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            // Tolerate transient network resets while reading the stream
            "-reconnect".into(),
            "1".into(),
            "-reconnect_streamed".into(),
            "1".into(),
            "-reconnect_delay_max".into(),
            "5".into(),
            "-i".into(),
            stream_url.to_string(),
            "-vn".into(),
            // Hard ceiling on decoded duration
            "-t".into(),
            format!("{}", self.config.max_duration_secs),
            "-af".into(),
            NORMALIZE_FILTERS.into(),
        ];
        args.extend(self.target_profile_args());
        args.push(output_path.to_string_lossy().into_owned());

        match ffmpeg::run(&self.config.ffmpeg_program, &args).await {
            Ok(_) => {}
            Err(ToolError::Exit { ref stderr, .. }) if ffmpeg::is_input_open_failure(stderr) => {
                return Err(PipelineError::SourceUnavailable(ffmpeg::stderr_tail(stderr)));
            }
            Err(e) => {
                return Err(PipelineError::NormalizationFailed(
                    e.message(&self.config.ffmpeg_program),
                ));
            }
        }

        self.verify_artifact(&output_path)?;

        info!("Normalized artifact written to {}", output_path.display());

        Ok(MediaArtifact {
            path: output_path,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        })
    }

    async fn probe_duration(&self, path: &Path) -> PipelineResult<f64> {
        let args: Vec<String> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "json".into(),
            path.to_string_lossy().into_owned(),
        ];

        let stdout = ffmpeg::run(&self.config.ffprobe_program, &args)
            .await
            .map_err(|e| PipelineError::ProbeFailed(e.message(&self.config.ffprobe_program)))?;

        let value: serde_json::Value = serde_json::from_slice(&stdout)
            .map_err(|e| PipelineError::ProbeFailed(format!("unparseable ffprobe output: {e}")))?;

        // A readable file without duration metadata probes as 0, not an error
        let duration = value["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        if duration == 0.0 {
            warn!("No duration metadata in {}, treating as 0s", path.display());
        }

        Ok(duration)
    }

    async fn extract_segment(
        &self,
        artifact: &MediaArtifact,
        plan: &SegmentPlan,
        output_dir: &Path,
    ) -> PipelineResult<Segment> {
        fs::create_dir_all(output_dir)?;
        let segment_path = output_dir.join(format!("chunk_{:03}.wav", plan.index));

        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-ss".into(),
            format!("{}", plan.start_secs),
            "-t".into(),
            format!("{}", plan.decode_secs),
            "-i".into(),
            artifact.path.to_string_lossy().into_owned(),
        ];
        args.extend(self.target_profile_args());
        args.push(segment_path.to_string_lossy().into_owned());

        ffmpeg::run(&self.config.ffmpeg_program, &args)
            .await
            .map_err(|e| {
                PipelineError::NormalizationFailed(format!(
                    "segment {} cut failed: {}",
                    plan.index,
                    e.message(&self.config.ffmpeg_program)
                ))
            })?;

        Ok(Segment::from_plan(plan, segment_path))
    }
}
