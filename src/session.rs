//! Intake and upload state.
//!
//! A [`Session`] holds one [`Phase`] and at most one [`ErrorState`]. The
//! phase is a single tagged value, so a selection and a success outcome can
//! never coexist. Transitions are driven by [`crate::intake::IntakePipeline`]
//! and [`crate::upload::UploadController`]; everything else only reads.

use crate::intake::ChosenFile;
use crate::midi::MidiDocument;

/// Which stage produced the current error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Declared MIME type not in the allow-list.
    FileType,
    /// Reading the file failed.
    Read,
    /// The bytes are not valid MIDI.
    Parse,
    /// The upload failed (network or server).
    Upload,
}

/// The error currently shown to the user.
///
/// Text is produced at render time by [`crate::presenter::error_message`] so it
/// follows language changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    pub kind: ErrorKind,
    /// Underlying description for read and upload errors.
    pub detail: Option<String>,
}

impl ErrorState {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

/// A validated, decoded file ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub file: ChosenFile,
    pub document: MidiDocument,
}

/// Where the session is in the intake/upload lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Nothing selected, no outcome.
    Empty,
    /// A file is decoded and waiting for upload.
    Selected(SelectedFile),
    /// The upload request is in flight; the controller owns the file.
    Uploading(SelectedFile),
    /// Upload finished; the selection has been released.
    Succeeded { location: String },
    /// Upload failed; the selection is kept so it can be retried.
    Failed {
        selected: SelectedFile,
        message: String,
    },
}

/// The upload result as seen by the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    None,
    Pending,
    Success(String),
    Failure(String),
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    error: Option<ErrorState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Empty,
            error: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn error(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }

    /// The file the user has selected, including while it is uploading or
    /// after a failed attempt.
    pub fn selected(&self) -> Option<&SelectedFile> {
        match &self.phase {
            Phase::Selected(selected)
            | Phase::Uploading(selected)
            | Phase::Failed { selected, .. } => Some(selected),
            Phase::Empty | Phase::Succeeded { .. } => None,
        }
    }

    pub fn outcome(&self) -> UploadOutcome {
        match &self.phase {
            Phase::Empty | Phase::Selected(_) => UploadOutcome::None,
            Phase::Uploading(_) => UploadOutcome::Pending,
            Phase::Succeeded { location } => UploadOutcome::Success(location.clone()),
            Phase::Failed { message, .. } => UploadOutcome::Failure(message.clone()),
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.phase, Phase::Uploading(_))
    }

    /// True when an upload may be started.
    pub fn can_upload(&self) -> bool {
        matches!(self.phase, Phase::Selected(_) | Phase::Failed { .. })
    }

    /// Clears the current error. Does not touch the outcome.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub(crate) fn set_error(&mut self, error: ErrorState) {
        self.error = Some(error);
    }

    /// Drops any prior outcome: a success returns to `Empty`, a failure back
    /// to `Selected` with the retained file.
    pub(crate) fn clear_outcome(&mut self) {
        self.phase = match std::mem::replace(&mut self.phase, Phase::Empty) {
            Phase::Succeeded { .. } => Phase::Empty,
            Phase::Failed { selected, .. } => Phase::Selected(selected),
            other => other,
        };
    }

    /// Replaces any selection with `selected`.
    pub(crate) fn select(&mut self, selected: SelectedFile) {
        self.phase = Phase::Selected(selected);
    }

    /// Moves the selection into `Uploading` and returns it. `None` when there
    /// is nothing to upload or an upload is already running.
    pub(crate) fn start_upload(&mut self) -> Option<&SelectedFile> {
        if !self.can_upload() {
            return None;
        }
        self.clear_outcome();
        self.error = None;
        if let Phase::Selected(selected) = std::mem::replace(&mut self.phase, Phase::Empty) {
            self.phase = Phase::Uploading(selected);
        }
        self.selected()
    }

    /// Records a successful upload, releasing the selection.
    pub(crate) fn finish_success(&mut self, location: String) -> bool {
        if !self.is_uploading() {
            return false;
        }
        self.phase = Phase::Succeeded { location };
        true
    }

    /// Records a failed upload, keeping the selection for a retry.
    pub(crate) fn finish_failure(&mut self, message: String) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Empty) {
            Phase::Uploading(selected) => {
                self.error = Some(ErrorState::with_detail(ErrorKind::Upload, message.clone()));
                self.phase = Phase::Failed { selected, message };
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{Header, MidiDocument};

    fn selected(name: &str) -> SelectedFile {
        SelectedFile {
            file: ChosenFile::with_declared_type(name, "audio/midi"),
            document: MidiDocument {
                header: Header {
                    name: String::new(),
                    ppq: 480,
                    tempos: Vec::new(),
                    time_signatures: Vec::new(),
                    key_signatures: Vec::new(),
                    meta: Vec::new(),
                },
                tracks: Vec::new(),
            },
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.phase(), &Phase::Empty);
        assert_eq!(session.outcome(), UploadOutcome::None);
        assert!(session.selected().is_none());
        assert!(!session.can_upload());
    }

    #[test]
    fn test_start_upload_requires_selection() {
        let mut session = Session::new();
        assert!(session.start_upload().is_none());
        assert_eq!(session.phase(), &Phase::Empty);
    }

    #[test]
    fn test_start_upload_is_not_reentrant() {
        let mut session = Session::new();
        session.select(selected("a.mid"));
        assert!(session.start_upload().is_some());
        assert!(session.start_upload().is_none());
        assert!(session.is_uploading());
    }

    #[test]
    fn test_success_releases_selection() {
        let mut session = Session::new();
        session.select(selected("a.mid"));
        session.start_upload();
        assert!(session.finish_success("https://store.example/1".to_string()));

        assert!(session.selected().is_none());
        assert_eq!(
            session.outcome(),
            UploadOutcome::Success("https://store.example/1".to_string())
        );
    }

    #[test]
    fn test_failure_keeps_selection_and_sets_error() {
        let mut session = Session::new();
        session.select(selected("a.mid"));
        session.start_upload();
        assert!(session.finish_failure("boom".to_string()));

        assert_eq!(session.selected().unwrap().file.name(), "a.mid");
        assert_eq!(session.outcome(), UploadOutcome::Failure("boom".to_string()));
        assert_eq!(session.error().unwrap().kind, ErrorKind::Upload);
        assert!(session.can_upload());

        // Dismissing the error leaves the outcome alone.
        session.dismiss_error();
        assert!(session.error().is_none());
        assert_eq!(session.outcome(), UploadOutcome::Failure("boom".to_string()));
    }

    #[test]
    fn test_retry_after_failure_clears_outcome() {
        let mut session = Session::new();
        session.select(selected("a.mid"));
        session.start_upload();
        session.finish_failure("boom".to_string());

        assert!(session.start_upload().is_some());
        assert_eq!(session.outcome(), UploadOutcome::Pending);
        assert!(session.error().is_none());
    }

    #[test]
    fn test_completion_outside_upload_is_ignored() {
        let mut session = Session::new();
        assert!(!session.finish_success("x".to_string()));
        assert!(!session.finish_failure("x".to_string()));
        assert_eq!(session.phase(), &Phase::Empty);
        assert!(session.error().is_none());
    }
}
