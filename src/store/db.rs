use std::path::Path;

use tracing::info;

use super::models::{LectureNotes, LectureTranscript};
use super::LectureStore;
use crate::error::{PipelineError, PipelineResult};

/// Embedded sled-backed store with one tree per document type.
///
/// sled writes are atomic per key, which is all the pipeline needs: each
/// run owns its own lecture identifier, so no cross-run locking exists.
pub struct SledStore {
    transcripts: sled::Tree,
    notes: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .map_err(|e| PipelineError::Store(format!("open {}: {e}", path.display())))?;

        let transcripts = db
            .open_tree("transcripts")
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        let notes = db
            .open_tree("notes")
            .map_err(|e| PipelineError::Store(e.to_string()))?;

        info!("Store opened at {}", path.display());

        Ok(Self { transcripts, notes })
    }

    fn get<T: serde::de::DeserializeOwned>(
        tree: &sled::Tree,
        lecture_id: &str,
    ) -> PipelineResult<Option<T>> {
        let raw = tree
            .get(lecture_id.as_bytes())
            .map_err(|e| PipelineError::Store(e.to_string()))?;

        match raw {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| PipelineError::Store(format!("corrupt document: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put<T: serde::Serialize>(
        tree: &sled::Tree,
        lecture_id: &str,
        value: &T,
    ) -> PipelineResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| PipelineError::Store(e.to_string()))?;
        tree.insert(lecture_id.as_bytes(), bytes)
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        tree.flush()
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LectureStore for SledStore {
    async fn find_transcript(&self, lecture_id: &str) -> PipelineResult<Option<LectureTranscript>> {
        Self::get(&self.transcripts, lecture_id)
    }

    async fn upsert_transcript(&self, transcript: &LectureTranscript) -> PipelineResult<()> {
        Self::put(&self.transcripts, &transcript.lecture_id, transcript)
    }

    async fn find_notes(&self, lecture_id: &str) -> PipelineResult<Option<LectureNotes>> {
        Self::get(&self.notes, lecture_id)
    }

    async fn upsert_notes(&self, notes: &LectureNotes) -> PipelineResult<()> {
        Self::put(&self.notes, &notes.lecture_id, notes)
    }
}
