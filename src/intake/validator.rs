//! Declared-type check run before any byte is read.

use thiserror::Error;

/// The only declared types accepted, matched exactly.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["audio/mid", "audio/midi", "audio/x-midi"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported file type: {declared:?}")]
pub struct FileTypeError {
    pub declared: String,
}

/// Passes only when `declared` is in [`ALLOWED_MIME_TYPES`]. The empty string
/// (an environment that could not label the file) fails.
pub fn check_type(declared: &str) -> Result<(), FileTypeError> {
    if ALLOWED_MIME_TYPES.contains(&declared) {
        Ok(())
    } else {
        Err(FileTypeError {
            declared: declared.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        for mime in ALLOWED_MIME_TYPES {
            assert_eq!(check_type(mime), Ok(()));
        }
    }

    #[test]
    fn test_rejects_everything_else() {
        for mime in [
            "",
            "audio/MIDI",
            " audio/midi",
            "audio/midi; charset=binary",
            "audio/x-mid",
            "application/octet-stream",
            "audio/mpeg",
        ] {
            let err = check_type(mime).unwrap_err();
            assert_eq!(err.declared, mime);
        }
    }
}
