//! File intake: validate, read, decode, select.
//!
//! The read is the only suspension point. [`IntakePipeline::choose`] runs the
//! synchronous steps and hands back a [`ReadRequest`]; the caller awaits
//! [`ReadRequest::read`] wherever it likes (inline, or on a spawned task) and
//! feeds the result to [`IntakePipeline::complete`] on the task that owns the
//! [`Session`].

use super::file::ChosenFile;
use super::validator::check_type;
use crate::midi::{MidiDecoder, SmfDecoder};
use crate::session::{ErrorKind, ErrorState, SelectedFile, Session};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to read {path:?}: {source}")]
pub struct ReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A validated file waiting to be read.
#[derive(Debug)]
pub struct ReadRequest {
    file: ChosenFile,
}

impl ReadRequest {
    /// Reads the whole file.
    pub async fn read(self) -> ReadCompletion {
        let result = tokio::fs::read(self.file.path())
            .await
            .map_err(|source| ReadError {
                path: self.file.path().to_path_buf(),
                source,
            });
        ReadCompletion {
            file: self.file,
            result,
        }
    }
}

/// Result of a [`ReadRequest`].
#[derive(Debug)]
pub struct ReadCompletion {
    pub file: ChosenFile,
    pub result: Result<Vec<u8>, ReadError>,
}

/// Validates and decodes chosen files into the session's selection.
#[derive(Clone)]
pub struct IntakePipeline {
    decoder: Arc<dyn MidiDecoder>,
}

impl Default for IntakePipeline {
    fn default() -> Self {
        Self::new(Arc::new(SmfDecoder))
    }
}

impl IntakePipeline {
    pub fn new(decoder: Arc<dyn MidiDecoder>) -> Self {
        Self { decoder }
    }

    /// Handles a "file chosen" event up to the read.
    ///
    /// Returns the read to perform, or `None` when the choice was cancelled,
    /// refused, or failed validation (the error is then on the session).
    pub fn choose(&self, session: &mut Session, file: Option<ChosenFile>) -> Option<ReadRequest> {
        let file = file?;

        if session.is_uploading() {
            tracing::warn!(file = %file.name(), "Ignoring file chosen during upload");
            return None;
        }

        session.dismiss_error();
        session.clear_outcome();

        if let Err(e) = check_type(file.declared_type()) {
            tracing::debug!(file = %file.name(), "{}", e);
            session.set_error(ErrorState::new(ErrorKind::FileType));
            return None;
        }

        tracing::debug!(file = %file.name(), "Reading chosen file");
        Some(ReadRequest { file })
    }

    /// Finishes a read: decodes the bytes and selects the file on success.
    pub fn complete(&self, session: &mut Session, completion: ReadCompletion) {
        let ReadCompletion { file, result } = completion;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{}", e);
                session.set_error(ErrorState::with_detail(ErrorKind::Read, e.source.to_string()));
                return;
            }
        };

        match self.decoder.decode(&bytes) {
            Ok(document) => {
                tracing::info!(
                    file = %file.name(),
                    tracks = document.tracks.len(),
                    notes = document.note_count(),
                    "Selected MIDI file"
                );
                session.select(SelectedFile { file, document });
            }
            Err(e) => {
                // The decoder's diagnostic stays in the log.
                tracing::debug!(file = %file.name(), "Decode failed: {}", e);
                session.set_error(ErrorState::new(ErrorKind::Parse));
            }
        }
    }

    /// Runs the whole intake inline.
    pub async fn on_file_chosen(&self, session: &mut Session, file: Option<ChosenFile>) {
        if let Some(request) = self.choose(session, file) {
            let completion = request.read().await;
            self.complete(session, completion);
        }
    }
}

impl std::fmt::Debug for IntakePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakePipeline").finish_non_exhaustive()
    }
}
