//! Thin subprocess runner for ffmpeg/ffprobe invocations.

use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Outcome of a failed ffmpeg/ffprobe invocation, before it is classified
/// into a pipeline error by the caller.
#[derive(Debug)]
pub enum ToolError {
    /// The binary could not be spawned at all.
    Spawn(std::io::Error),
    /// The tool ran but exited non-zero.
    Exit { status: i32, stderr: String },
}

impl ToolError {
    pub fn message(&self, program: &str) -> String {
        match self {
            Self::Spawn(e) => format!("failed to spawn {program}: {e}"),
            Self::Exit { status, stderr } => {
                format!("{program} exited with status {status}: {}", stderr_tail(stderr))
            }
        }
    }
}

/// Run a media tool to completion, capturing stdout and stderr.
pub async fn run(program: &str, args: &[String]) -> Result<Vec<u8>, ToolError> {
    debug!("{} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(ToolError::Spawn)?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(ToolError::Exit {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Last few stderr lines, enough to diagnose without dumping a full log.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(4);
    lines[start..].join(" | ")
}

/// Heuristic: did ffmpeg fail opening/reading the input (network, 404, DNS)
/// rather than during transcoding?
pub fn is_input_open_failure(stderr: &str) -> bool {
    const MARKERS: [&str; 7] = [
        "Error opening input",
        "Failed to open",
        "Connection refused",
        "Connection timed out",
        "Server returned 4",
        "Server returned 5",
        "Name or service not known",
    ];
    MARKERS.iter().any(|m| stderr.contains(m))
}
