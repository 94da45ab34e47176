//! The file handle a user picks, labeled with a declared MIME type.

use std::path::{Path, PathBuf};

/// A file chosen by the user.
///
/// The declared type is a label, like the one a browser file picker attaches:
/// it comes from the extension (or the caller), never from the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenFile {
    path: PathBuf,
    name: String,
    declared_type: String,
}

impl ChosenFile {
    /// Labels the file from its extension with [`declared_type_for`].
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let declared_type = declared_type_for(&path).to_string();
        Self::with_declared_type(path, declared_type)
    }

    /// Uses an explicit declared type.
    pub fn with_declared_type(path: impl Into<PathBuf>, declared_type: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            declared_type: declared_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown to the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }
}

/// MIME label for a path, from its extension. Unknown extensions get the
/// empty string.
pub fn declared_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mid") | Some("midi") | Some("kar") => "audio/midi",
        Some("rmi") => "audio/mid",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "",
    }
}
