//! midishare - validate MIDI files and share them through a JSON blob store.
//!
//! A chosen file is checked against an allow-list of MIDI MIME types, read,
//! decoded into a [`midi::MidiDocument`], and on request uploaded as JSON.
//! The store's `Location` header becomes the share link.

pub mod app;
pub mod i18n;
pub mod intake;
pub mod midi;
pub mod preferences;
pub mod presenter;
pub mod session;
pub mod ui;
pub mod upload;

// Re-export commonly used types
pub use app::{App, AppMessage};
pub use i18n::{LanguageCode, MessageKey};
pub use intake::{ChosenFile, IntakePipeline};
pub use midi::{MidiDecoder, MidiDocument, SmfDecoder};
pub use preferences::{FileStore, LanguagePreference, MemoryStore, PreferenceStore};
pub use session::{ErrorKind, ErrorState, Phase, Session, UploadOutcome};
pub use upload::{StorageClient, UploadController, UploadError, DEFAULT_ENDPOINT};
