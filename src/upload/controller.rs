//! Drives a selected document through one upload attempt.
//!
//! Like intake, an upload is split around its single suspension point:
//! [`UploadController::begin`] moves the session to `Uploading` and returns an
//! [`UploadJob`]; the caller awaits [`UploadJob::send`] and passes the result
//! to [`UploadController::complete`].

use super::client::{encode, StorageClient, UploadError};
use crate::session::Session;

/// One in-flight upload request.
#[derive(Debug)]
pub struct UploadJob {
    client: StorageClient,
    body: Vec<u8>,
}

impl UploadJob {
    pub async fn send(self) -> Result<String, UploadError> {
        self.client.store_body(self.body).await
    }
}

#[derive(Debug, Clone)]
pub struct UploadController {
    client: StorageClient,
}

impl UploadController {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }

    /// Starts an upload of the current selection.
    ///
    /// No-op returning `None` while another upload is in flight or when
    /// nothing is selected. Otherwise clears the error and prior outcome and
    /// transitions to `Uploading`.
    pub fn begin(&self, session: &mut Session) -> Option<UploadJob> {
        if session.is_uploading() {
            tracing::debug!("Upload already in flight");
            return None;
        }

        let selected = session.start_upload()?;
        tracing::debug!(file = %selected.file.name(), "Starting upload");

        match encode(&selected.document) {
            Ok(body) => Some(UploadJob {
                client: self.client.clone(),
                body,
            }),
            Err(e) => {
                self.complete(session, Err(e));
                None
            }
        }
    }

    /// Applies the result of [`UploadJob::send`].
    pub fn complete(&self, session: &mut Session, result: Result<String, UploadError>) {
        let applied = match result {
            Ok(location) => session.finish_success(location),
            Err(e) => {
                tracing::warn!("Upload failed: {}", e);
                session.finish_failure(e.to_string())
            }
        };
        if !applied {
            tracing::warn!("Upload completion arrived with no upload in flight");
        }
    }

    /// Runs one upload attempt inline.
    pub async fn upload(&self, session: &mut Session) {
        if let Some(job) = self.begin(session) {
            let result = job.send().await;
            self.complete(session, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{ChosenFile, IntakePipeline};
    use crate::midi::test_support;
    use crate::session::{ErrorKind, Phase, UploadOutcome};
    use crate::upload::mock_store::{self, Reply};

    async fn session_with_selection(dir: &tempfile::TempDir) -> Session {
        let path = dir.path().join("song.mid");
        std::fs::write(&path, test_support::simple_song()).unwrap();

        let mut session = Session::new();
        IntakePipeline::default()
            .on_file_chosen(&mut session, Some(ChosenFile::from_path(&path)))
            .await;
        assert!(session.selected().is_some());
        session
    }

    fn controller(url: &str) -> UploadController {
        UploadController::new(StorageClient::new(url).unwrap())
    }

    #[tokio::test]
    async fn test_success_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = mock_store::serve(Reply::Created("https://store.example/abc123")).await;
        let mut session = session_with_selection(&dir).await;

        controller(&store.url).upload(&mut session).await;

        assert_eq!(
            session.outcome(),
            UploadOutcome::Success("https://store.example/abc123".to_string())
        );
        assert!(session.selected().is_none());
        assert!(session.error().is_none());

        let bodies = store.bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["header"]["ppq"], 480);
    }

    #[tokio::test]
    async fn test_begin_while_uploading_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = mock_store::serve(Reply::Created("https://store.example/1")).await;
        let controller = controller(&store.url);
        let mut session = session_with_selection(&dir).await;

        let job = controller.begin(&mut session).expect("first begin");
        assert_eq!(session.outcome(), UploadOutcome::Pending);
        assert!(controller.begin(&mut session).is_none());
        assert!(controller.begin(&mut session).is_none());

        let result = job.send().await;
        controller.complete(&mut session, result);

        assert_eq!(store.requests().len(), 1);
        assert!(matches!(session.phase(), Phase::Succeeded { .. }));
    }

    #[tokio::test]
    async fn test_begin_without_selection_is_noop() {
        let controller = controller("http://127.0.0.1:9/api/jsonBlob");
        let mut session = Session::new();
        assert!(controller.begin(&mut session).is_none());
        assert_eq!(session.phase(), &Phase::Empty);
    }

    #[tokio::test]
    async fn test_failure_surfaces_body_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = mock_store::serve(Reply::Status(
            429,
            Some(r#"{"message":"quota exceeded"}"#),
        ))
        .await;
        let mut session = session_with_selection(&dir).await;

        controller(&store.url).upload(&mut session).await;

        assert_eq!(
            session.outcome(),
            UploadOutcome::Failure("quota exceeded".to_string())
        );
        let error = session.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Upload);
        assert_eq!(error.detail.as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn test_failure_keeps_selection_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let failing = mock_store::serve(Reply::Status(503, None)).await;
        let working = mock_store::serve(Reply::Created("https://store.example/again")).await;
        let mut session = session_with_selection(&dir).await;

        controller(&failing.url).upload(&mut session).await;
        assert_eq!(session.selected().unwrap().file.name(), "song.mid");

        controller(&working.url).upload(&mut session).await;
        assert_eq!(
            session.outcome(),
            UploadOutcome::Success("https://store.example/again".to_string())
        );
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_late_completion_is_ignored() {
        let controller = controller("http://127.0.0.1:9/api/jsonBlob");
        let mut session = Session::new();
        controller.complete(&mut session, Ok("https://store.example/x".to_string()));
        assert_eq!(session.phase(), &Phase::Empty);
    }
}
