//! Application state and event handling.
//!
//! `App` owns the [`Session`] and applies every transition on the UI task.
//! File reads and upload requests run on spawned tokio tasks and report back
//! as [`AppMessage`]s over an unbounded channel; the owning loop feeds them to
//! [`App::handle_message`].

use crate::i18n::{text, LanguageCode, MessageKey};
use crate::intake::{check_type, declared_type_for, ChosenFile, IntakePipeline, ReadCompletion};
use crate::preferences::LanguagePreference;
use crate::presenter::{copy_to_clipboard, ClipboardSink, COPY_ACK_DELAY};
use crate::session::{Phase, Session};
use crate::upload::{UploadController, UploadError};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// How long a status message stays visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Rows the file browser shows at once.
pub const FILE_BROWSER_ROWS: usize = 10;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Completions sent back from background tasks.
#[derive(Debug)]
pub enum AppMessage {
    ReadFinished(ReadCompletion),
    UploadFinished(Result<String, UploadError>),
    /// The copy acknowledgement delay elapsed.
    CopyAcknowledged,
}

/// State for the file browser dialog.
#[derive(Debug, Clone)]
pub struct FileBrowserState {
    /// Whether the browser is open.
    pub open: bool,
    /// Current directory path.
    pub current_dir: PathBuf,
    /// `..`, then directories, then files, each sorted.
    pub entries: Vec<PathBuf>,
    /// Currently selected index.
    pub selected: usize,
    /// Scroll offset for long lists.
    pub scroll: usize,
}

impl Default for FileBrowserState {
    fn default() -> Self {
        Self {
            open: false,
            current_dir: std::env::current_dir().unwrap_or_default(),
            entries: Vec::new(),
            selected: 0,
            scroll: 0,
        }
    }
}

impl FileBrowserState {
    /// True if `path` is offered as a MIDI file (highlighted in the list).
    pub fn is_midi(path: &std::path::Path) -> bool {
        path.is_file() && check_type(declared_type_for(path)).is_ok()
    }
}

pub struct App {
    session: Session,
    language: LanguagePreference,
    intake: IntakePipeline,
    uploader: UploadController,
    clipboard: Box<dyn ClipboardSink + Send>,
    messages: UnboundedSender<AppMessage>,
    /// Declared type to attach to chosen files instead of the extension's.
    mime_override: Option<String>,
    /// A file read is in flight.
    reading: bool,
    spinner_frame: usize,
    /// Status message with timestamp.
    pub status_message: Option<(String, Instant)>,
    pub file_browser: FileBrowserState,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        language: LanguagePreference,
        intake: IntakePipeline,
        uploader: UploadController,
        clipboard: Box<dyn ClipboardSink + Send>,
        messages: UnboundedSender<AppMessage>,
    ) -> Self {
        Self {
            session: Session::new(),
            language,
            intake,
            uploader,
            clipboard,
            messages,
            mime_override: None,
            reading: false,
            spinner_frame: 0,
            status_message: None,
            file_browser: FileBrowserState::default(),
            show_help: false,
            should_quit: false,
        }
    }

    pub fn with_mime_override(mut self, mime: Option<String>) -> Self {
        self.mime_override = mime;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn language(&self) -> LanguageCode {
        self.language.current()
    }

    pub fn is_reading(&self) -> bool {
        self.reading
    }

    /// File selection is disabled while a read or an upload is running.
    pub fn can_choose(&self) -> bool {
        !self.reading && !self.session.is_uploading()
    }

    pub fn can_upload(&self) -> bool {
        !self.reading && self.session.can_upload()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Periodic housekeeping: advances the spinner and expires the status line.
    pub fn tick(&mut self) {
        if self.session.is_uploading() || self.reading {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Starts intake for `path`, reading it on a background task.
    pub fn choose_path(&mut self, path: PathBuf) {
        let file = match &self.mime_override {
            Some(mime) => ChosenFile::with_declared_type(path, mime.clone()),
            None => ChosenFile::from_path(path),
        };
        self.choose_file(file);
    }

    pub fn choose_file(&mut self, file: ChosenFile) {
        if !self.can_choose() {
            tracing::debug!(file = %file.name(), "File selection is disabled");
            return;
        }

        if let Some(request) = self.intake.choose(&mut self.session, Some(file)) {
            self.reading = true;
            let tx = self.messages.clone();
            tokio::spawn(async move {
                let completion = request.read().await;
                let _ = tx.send(AppMessage::ReadFinished(completion));
            });
        }
    }

    /// Uploads the current selection on a background task.
    pub fn start_upload(&mut self) {
        if !self.can_upload() {
            return;
        }

        if let Some(job) = self.uploader.begin(&mut self.session) {
            let tx = self.messages.clone();
            tokio::spawn(async move {
                let result = job.send().await;
                let _ = tx.send(AppMessage::UploadFinished(result));
            });
        }
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::ReadFinished(completion) => {
                self.reading = false;
                self.intake.complete(&mut self.session, completion);
            }
            AppMessage::UploadFinished(result) => {
                self.uploader.complete(&mut self.session, result);
            }
            AppMessage::CopyAcknowledged => {
                self.set_status(text(self.language(), MessageKey::Copied));
            }
        }
    }

    /// Copies the share link, if there is one, and schedules the
    /// acknowledgement.
    pub fn copy_link(&mut self) {
        let Phase::Succeeded { location } = self.session.phase() else {
            return;
        };

        copy_to_clipboard(self.clipboard.as_mut(), location);

        let tx = self.messages.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPY_ACK_DELAY).await;
            let _ = tx.send(AppMessage::CopyAcknowledged);
        });
    }

    pub fn toggle_language(&mut self) {
        let lang = self.language.toggle();
        tracing::debug!(language = %lang, "Language changed");
    }

    /// The alert's retry action: clears the error so the user can try again.
    pub fn dismiss_error(&mut self) {
        self.session.dismiss_error();
    }

    // ========== FILE BROWSER ==========

    /// Opens the file browser in the current directory.
    pub fn open_file_browser(&mut self) {
        if !self.can_choose() {
            return;
        }
        self.file_browser.open = true;
        self.file_browser.selected = 0;
        self.file_browser.scroll = 0;
        self.refresh_file_browser();
    }

    /// Opens the file browser in `dir`.
    pub fn open_file_browser_in(&mut self, dir: PathBuf) {
        self.file_browser.current_dir = dir;
        self.open_file_browser();
    }

    fn refresh_file_browser(&mut self) {
        self.file_browser.entries.clear();

        if self.file_browser.current_dir.parent().is_some() {
            self.file_browser.entries.push(PathBuf::from(".."));
        }

        match std::fs::read_dir(&self.file_browser.current_dir) {
            Ok(entries) => {
                let mut dirs: Vec<PathBuf> = Vec::new();
                let mut files: Vec<PathBuf> = Vec::new();

                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        dirs.push(path);
                    } else {
                        // Everything is listed; the type check happens on choose.
                        files.push(path);
                    }
                }

                dirs.sort();
                files.sort();

                self.file_browser.entries.extend(dirs);
                self.file_browser.entries.extend(files);
            }
            Err(e) => {
                tracing::warn!(
                    "Cannot list {}: {}",
                    self.file_browser.current_dir.display(),
                    e
                );
            }
        }

        if self.file_browser.selected >= self.file_browser.entries.len() {
            self.file_browser.selected = 0;
        }
    }

    pub fn file_browser_up(&mut self) {
        if self.file_browser.open && self.file_browser.selected > 0 {
            self.file_browser.selected -= 1;
            if self.file_browser.selected < self.file_browser.scroll {
                self.file_browser.scroll = self.file_browser.selected;
            }
        }
    }

    pub fn file_browser_down(&mut self) {
        if self.file_browser.open
            && self.file_browser.selected + 1 < self.file_browser.entries.len()
        {
            self.file_browser.selected += 1;
            if self.file_browser.selected >= self.file_browser.scroll + FILE_BROWSER_ROWS {
                self.file_browser.scroll =
                    self.file_browser.selected + 1 - FILE_BROWSER_ROWS;
            }
        }
    }

    /// Enters the highlighted directory, or chooses the highlighted file.
    pub fn file_browser_select(&mut self) {
        if !self.file_browser.open {
            return;
        }
        let Some(selected_path) = self.file_browser.entries.get(self.file_browser.selected).cloned()
        else {
            return;
        };

        if selected_path == PathBuf::from("..") {
            self.file_browser_parent();
        } else if selected_path.is_dir() {
            self.file_browser.current_dir = selected_path;
            self.file_browser.selected = 0;
            self.file_browser.scroll = 0;
            self.refresh_file_browser();
        } else {
            self.file_browser.open = false;
            self.choose_path(selected_path);
        }
    }

    pub fn file_browser_parent(&mut self) {
        if !self.file_browser.open {
            return;
        }
        if let Some(parent) = self.file_browser.current_dir.parent() {
            self.file_browser.current_dir = parent.to_path_buf();
            self.file_browser.selected = 0;
            self.file_browser.scroll = 0;
            self.refresh_file_browser();
        }
    }

    /// Closing the browser is a cancelled choice: nothing changes.
    pub fn file_browser_cancel(&mut self) {
        self.file_browser.open = false;
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("session", &self.session)
            .field("language", &self.language.current())
            .field("reading", &self.reading)
            .finish_non_exhaustive()
    }
}
