//! Persisted display-language preference.
//!
//! The preference lives behind a small key-value [`PreferenceStore`] so the
//! resolution rules can be exercised against [`MemoryStore`] in tests while the
//! binary uses [`FileStore`] under the platform config directory.

use crate::i18n::LanguageCode;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key holding the two-letter language code.
pub const LANGUAGE_KEY: &str = "appLanguage";

/// File name of the on-disk store inside the config directory.
const PREFERENCES_FILE: &str = "preferences.json";

/// Errors from reading or writing persisted preferences.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal string key-value capability.
pub trait PreferenceStore: Send {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// JSON object file store, e.g. `~/.config/midishare/preferences.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by `preferences.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PREFERENCES_FILE),
        }
    }

    /// Creates a store in the platform config directory, falling back to the
    /// working directory when the platform has none.
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .map(|d| d.join("midishare"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(dir)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                tracing::warn!("Ignoring unreadable preferences at {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        // A corrupt file is replaced rather than blocking every future write.
        // One that cannot be read at all is left alone.
        let mut values = match self.load() {
            Ok(values) => values,
            Err(PreferenceError::Json(e)) => {
                tracing::warn!("Replacing corrupt preferences at {:?}: {}", self.path, e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `key = value`.
    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Reads the host locale signal: the first non-empty of `LC_ALL`,
/// `LC_MESSAGES` and `LANG`, verbatim.
pub fn host_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

/// Maps a host locale to a language.
///
/// Only the exact value `"ja"` selects Japanese. `"ja-JP"`, `"ja_JP.UTF-8"`
/// and everything else fall back to English; there is no prefix matching.
pub fn language_from_locale(locale: Option<&str>) -> LanguageCode {
    match locale {
        Some("ja") => LanguageCode::Ja,
        _ => LanguageCode::En,
    }
}

/// The active display language and the store it persists to.
pub struct LanguagePreference {
    current: LanguageCode,
    store: Box<dyn PreferenceStore>,
}

impl LanguagePreference {
    /// Resolves the initial language.
    ///
    /// A persisted, recognized code wins. Otherwise the host locale decides
    /// via [`language_from_locale`]. Never fails.
    pub fn resolve_initial(store: Box<dyn PreferenceStore>, host_locale: Option<&str>) -> Self {
        let persisted = store
            .get(LANGUAGE_KEY)
            .and_then(|code| match code.parse::<LanguageCode>() {
                Ok(lang) => Some(lang),
                Err(e) => {
                    tracing::warn!("Ignoring persisted language: {}", e);
                    None
                }
            });

        let current = persisted.unwrap_or_else(|| language_from_locale(host_locale));
        tracing::debug!(language = %current, persisted = persisted.is_some(), "Resolved display language");

        Self { current, store }
    }

    /// The active language.
    pub fn current(&self) -> LanguageCode {
        self.current
    }

    /// Sets and persists the language. Persistence is best-effort.
    pub fn set(&mut self, code: LanguageCode) {
        self.current = code;
        if let Err(e) = self.store.set(LANGUAGE_KEY, code.as_str()) {
            tracing::warn!("Failed to persist language preference: {}", e);
        }
    }

    /// Switches to the other language and persists it.
    pub fn toggle(&mut self) -> LanguageCode {
        self.set(self.current.next());
        self.current
    }
}

impl std::fmt::Debug for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguagePreference")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ja_locale_selects_japanese() {
        let pref = LanguagePreference::resolve_initial(Box::new(MemoryStore::new()), Some("ja"));
        assert_eq!(pref.current(), LanguageCode::Ja);
    }

    #[test]
    fn test_regional_locale_falls_back_to_english() {
        for locale in ["ja-JP", "ja_JP.UTF-8", "JA", "en_US.UTF-8", ""] {
            let pref =
                LanguagePreference::resolve_initial(Box::new(MemoryStore::new()), Some(locale));
            assert_eq!(pref.current(), LanguageCode::En, "locale {locale:?}");
        }
        let pref = LanguagePreference::resolve_initial(Box::new(MemoryStore::new()), None);
        assert_eq!(pref.current(), LanguageCode::En);
    }

    #[test]
    fn test_persisted_value_wins_over_locale() {
        let store = MemoryStore::with(LANGUAGE_KEY, "en");
        let pref = LanguagePreference::resolve_initial(Box::new(store), Some("ja"));
        assert_eq!(pref.current(), LanguageCode::En);
    }

    #[test]
    fn test_unknown_persisted_value_is_ignored() {
        let store = MemoryStore::with(LANGUAGE_KEY, "fr");
        let pref = LanguagePreference::resolve_initial(Box::new(store), Some("ja"));
        assert_eq!(pref.current(), LanguageCode::Ja);
    }

    #[test]
    fn test_set_persists() {
        let store = MemoryStore::new();
        let mut pref = LanguagePreference::resolve_initial(Box::new(store.clone()), None);
        pref.set(LanguageCode::Ja);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("ja"));

        assert_eq!(pref.toggle(), LanguageCode::En);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("en"));
    }

    #[test]
    fn test_file_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let mut pref =
            LanguagePreference::resolve_initial(Box::new(FileStore::in_dir(dir.path())), None);
        pref.set(LanguageCode::Ja);

        let reopened =
            LanguagePreference::resolve_initial(Box::new(FileStore::in_dir(dir.path())), None);
        assert_eq!(reopened.current(), LanguageCode::Ja);
    }

    #[test]
    fn test_file_store_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert_eq!(store.get(LANGUAGE_KEY), None);
        store.set(LANGUAGE_KEY, "ja").unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("ja"));
    }

    #[test]
    fn test_file_store_keeps_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        // Not UTF-8, so the read fails before any JSON parsing.
        let original = [0xff, 0xfe, 0x00, 0x7b];
        fs::write(store.path(), original).unwrap();

        let result = store.set(LANGUAGE_KEY, "ja");

        assert!(matches!(result, Err(PreferenceError::Io(_))));
        assert_eq!(fs::read(store.path()).unwrap(), original);
    }
}
