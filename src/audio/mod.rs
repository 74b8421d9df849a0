pub mod backend;
pub mod ffmpeg;
pub mod partition;

pub use backend::{FfmpegBackend, MediaArtifact, MediaBackend};
pub use partition::{plan_segments, Partitioner, Segment, SegmentPlan};
