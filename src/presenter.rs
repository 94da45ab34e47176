//! Turns session state into localized display text, and copies share links.

use crate::i18n::{text, LanguageCode, MessageKey};
use crate::intake::ChosenFile;
use crate::session::{ErrorKind, ErrorState};
use std::time::Duration;
use thiserror::Error;

/// Delay before the "copied" acknowledgement appears.
pub const COPY_ACK_DELAY: Duration = Duration::from_millis(300);

/// Text for the current error, in `lang`.
///
/// Parse failures always show the same generic text; the decoder's own
/// diagnostic is only logged.
pub fn error_message(lang: LanguageCode, error: &ErrorState) -> String {
    match error.kind {
        ErrorKind::FileType => text(lang, MessageKey::FileTypeError).to_string(),
        ErrorKind::Parse => format!(
            "{}{}",
            text(lang, MessageKey::ErrorPrefix),
            text(lang, MessageKey::InvalidMidi)
        ),
        ErrorKind::Read | ErrorKind::Upload => format!(
            "{}{}",
            text(lang, MessageKey::ErrorPrefix),
            error.detail.as_deref().unwrap_or_default()
        ),
    }
}

pub fn success_message(lang: LanguageCode, url: &str) -> String {
    format!("{} {}", text(lang, MessageKey::Success), url)
}

pub fn selected_label(lang: LanguageCode, file: &ChosenFile) -> String {
    format!("{} {}", text(lang, MessageKey::SelectedFile), file.name())
}

pub fn upload_button_label(lang: LanguageCode, uploading: bool) -> &'static str {
    if uploading {
        text(lang, MessageKey::Uploading)
    } else {
        text(lang, MessageKey::Upload)
    }
}

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere a share link can be written.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard. Opened per copy since a long-lived handle can go
/// stale on some X11 setups.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        arboard::Clipboard::new()
            .and_then(|mut cb| cb.set_text(text.to_string()))
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Copies `url`. Failures are logged and otherwise ignored.
pub fn copy_to_clipboard(sink: &mut dyn ClipboardSink, url: &str) {
    match sink.set_text(url) {
        Ok(()) => tracing::debug!(url, "Copied link"),
        Err(e) => tracing::debug!("Copy failed: {}", e),
    }
}
