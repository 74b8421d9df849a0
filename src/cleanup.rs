//! Removal of temp files left behind by processing: normalized audio,
//! segment directories, downloaded documents, and extracted text.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

#[derive(Debug, Default, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub errors: Vec<CleanupError>,
}

#[derive(Debug, Serialize)]
pub struct CleanupError {
    pub path: String,
    pub error: String,
}

pub struct Cleaner {
    audio_dir: PathBuf,
    document_dir: PathBuf,
}

impl Cleaner {
    pub fn new(audio_dir: impl Into<PathBuf>, document_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            document_dir: document_dir.into(),
        }
    }

    /// Remove temp files for one lecture. Missing paths are skipped; per-path
    /// failures are collected rather than aborting.
    pub fn cleanup_lecture(&self, lecture_id: &str) -> CleanupReport {
        let targets = [
            self.audio_dir.join(format!("{lecture_id}.wav")),
            self.audio_dir.join("chunks").join(lecture_id),
            self.document_dir.join(format!("{lecture_id}.pdf")),
            self.document_dir.join(format!("{lecture_id}.txt")),
        ];

        let mut report = CleanupReport::default();
        for target in &targets {
            remove_path(target, &mut report);
        }

        info!(
            "Cleanup for {}: removed {} paths",
            lecture_id,
            report.removed.len()
        );
        report
    }

    /// Remove everything under both workdirs, keeping the directories.
    pub fn cleanup_all(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        for dir in [&self.audio_dir, &self.document_dir] {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                remove_path(&entry.path(), &mut report);
            }
        }

        info!("Cleanup (all): removed {} paths", report.removed.len());
        report
    }
}

fn remove_path(path: &Path, report: &mut CleanupReport) {
    if !path.exists() {
        return;
    }

    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => report.removed.push(path.display().to_string()),
        Err(e) => report.errors.push(CleanupError {
            path: path.display().to_string(),
            error: e.to_string(),
        }),
    }
}
