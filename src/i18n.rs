//! Localized user-facing strings.
//!
//! Every piece of text the interface shows is looked up here by
//! `(LanguageCode, MessageKey)`. The table is static; adding a language means
//! adding a variant to [`LanguageCode`] and an arm to [`text`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    /// English (the fallback for every unrecognized locale).
    #[default]
    En,
    /// Japanese.
    Ja,
}

impl LanguageCode {
    /// All supported languages, in selector order.
    pub const ALL: [LanguageCode; 2] = [LanguageCode::En, LanguageCode::Ja];

    /// Two-letter code used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Ja => "ja",
        }
    }

    /// Name of the language in that language, for the selector.
    pub fn native_name(self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Ja => "日本語",
        }
    }

    /// The other language. With two languages the selector is a toggle.
    pub fn next(self) -> Self {
        match self {
            LanguageCode::En => LanguageCode::Ja,
            LanguageCode::Ja => LanguageCode::En,
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a supported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0:?}")]
pub struct UnknownLanguage(pub String);

impl FromStr for LanguageCode {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(LanguageCode::En),
            "ja" => Ok(LanguageCode::Ja),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Keys into the string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Title,
    SelectFile,
    FileTypeError,
    /// Prefix prepended to read and upload error details.
    ErrorPrefix,
    InvalidMidi,
    SelectedFile,
    Retry,
    Privacy,
    Uploading,
    Upload,
    Success,
    Copy,
    Copied,
    Deletion,
}

/// Looks up the text for `key` in `lang`.
pub fn text(lang: LanguageCode, key: MessageKey) -> &'static str {
    use MessageKey::*;

    match lang {
        LanguageCode::En => match key {
            Title => "MIDI File Upload",
            SelectFile => "Select MIDI File",
            FileTypeError => "Please select a MIDI file (.mid or .midi).",
            ErrorPrefix => "An error occurred: ",
            InvalidMidi => "Invalid MIDI format",
            SelectedFile => "Selected file:",
            Retry => "Retry",
            Privacy => "The file is converted to JSON on this machine and only the converted data is uploaded.",
            Uploading => "Uploading...",
            Upload => "Upload",
            Success => "Upload complete! Share this link:",
            Copy => "Copy",
            Copied => "Link copied to clipboard.",
            Deletion => "Uploaded data may be deleted after a period of inactivity.",
        },
        LanguageCode::Ja => match key {
            Title => "MIDIファイルアップロード",
            SelectFile => "MIDIファイルを選択",
            FileTypeError => "MIDIファイル（.midまたは.midi）を選択してください。",
            ErrorPrefix => "エラーが発生しました: ",
            InvalidMidi => "MIDIの形式が正しくありません",
            SelectedFile => "選択されたファイル:",
            Retry => "再試行",
            Privacy => "ファイルはこのマシン上でJSONに変換され、変換後のデータのみがアップロードされます。",
            Uploading => "アップロード中...",
            Upload => "アップロード",
            Success => "アップロード完了！こちらのリンクを共有してください:",
            Copy => "コピー",
            Copied => "リンクをクリップボードにコピーしました。",
            Deletion => "アップロードされたデータは一定期間アクセスがないと削除される場合があります。",
        },
    }
}
