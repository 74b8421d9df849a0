//! Subprocess-backed engine implementations.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use super::{DocumentExtractor, SpeechToText};
use crate::error::{PipelineError, PipelineResult};

async fn run_command(program: &str, args: &[String]) -> Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| format!("failed to spawn {program}: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
        return Err(format!(
            "{program} exited with status {}: {}",
            output.status.code().unwrap_or(-1),
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Speech-to-text via a configured CLI (e.g. a whisper binary). The segment
/// path is appended as the final argument; the transcript is read from
/// stdout.
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// `command` is the program followed by its fixed arguments.
    pub fn new(command: &[String]) -> Self {
        let (program, args) = command
            .split_first()
            .map(|(p, rest)| (p.clone(), rest.to_vec()))
            .unwrap_or_else(|| ("whisper-cli".to_string(), Vec::new()));
        Self { program, args }
    }
}

#[async_trait::async_trait]
impl SpeechToText for CommandTranscriber {
    async fn transcribe(&self, segment_path: &Path) -> PipelineResult<String> {
        let mut args = self.args.clone();
        args.push(segment_path.to_string_lossy().into_owned());

        let stdout = run_command(&self.program, &args)
            .await
            .map_err(PipelineError::TranscriptionFailed)?;

        Ok(stdout.trim().to_string())
    }
}

/// Document extraction: download the PDF, then run a configured OCR command
/// as `<cmd> <pdf_path> <txt_path>` and read the text it writes.
pub struct CommandExtractor {
    client: reqwest::Client,
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
}

impl CommandExtractor {
    pub fn new(command: &[String], workdir: impl Into<PathBuf>) -> Self {
        let (program, args) = command
            .split_first()
            .map(|(p, rest)| (p.clone(), rest.to_vec()))
            .unwrap_or_else(|| ("pdf-ocr".to_string(), Vec::new()));
        Self {
            client: reqwest::Client::new(),
            program,
            args,
            workdir: workdir.into(),
        }
    }

    async fn download(&self, document_url: &str, pdf_path: &Path) -> PipelineResult<()> {
        info!("Downloading document from {}", document_url);

        let response = self
            .client
            .get(document_url)
            .send()
            .await
            .map_err(|e| PipelineError::ExtractionFailed(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::ExtractionFailed(format!(
                "download failed: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::ExtractionFailed(format!("download failed: {e}")))?;

        tokio::fs::write(pdf_path, &bytes).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentExtractor for CommandExtractor {
    async fn extract(&self, document_url: &str, lecture_id: &str) -> PipelineResult<String> {
        tokio::fs::create_dir_all(&self.workdir).await?;

        let pdf_path = self.workdir.join(format!("{lecture_id}.pdf"));
        let txt_path = self.workdir.join(format!("{lecture_id}.txt"));

        self.download(document_url, &pdf_path).await?;

        let mut args = self.args.clone();
        args.push(pdf_path.to_string_lossy().into_owned());
        args.push(txt_path.to_string_lossy().into_owned());

        if let Err(e) = run_command(&self.program, &args).await {
            return Err(PipelineError::ExtractionFailed(e));
        }

        let text = tokio::fs::read_to_string(&txt_path).await.map_err(|e| {
            PipelineError::ExtractionFailed(format!(
                "extractor wrote no text file at {}: {e}",
                txt_path.display()
            ))
        })?;

        if text.trim().is_empty() {
            warn!("Document {} extracted to empty text", lecture_id);
        }

        Ok(text)
    }
}
