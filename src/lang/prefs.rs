//! Persistent language preferences.
//!
//! [`PreferenceStore`] keeps the user's last-chosen source/target languages
//! in a tiny TOML file (`preferences.toml`, two string keys).  Loading never
//! fails: anything missing, unreadable, or referencing a code outside the
//! catalog falls back to the documented defaults.  Saving is best-effort and
//! synchronous — it is called at the moment a language changes so a crash
//! mid-session never loses the last confirmed choice.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::AppPaths;
use crate::lang::catalog::{self, AUTO_UI_CODE};

// ---------------------------------------------------------------------------
// LanguagePreferences
// ---------------------------------------------------------------------------

/// The user's current source/target language selection (UI codes).
///
/// Invariant: `target_lang` is never `"auto"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePreferences {
    /// Source language UI code; `"auto"` enables service-side detection.
    pub source_lang: String,
    /// Target language UI code; always a concrete language.
    pub target_lang: String,
}

impl Default for LanguagePreferences {
    fn default() -> Self {
        Self {
            source_lang: AUTO_UI_CODE.into(),
            target_lang: "en".into(),
        }
    }
}

impl LanguagePreferences {
    /// Replace any invalid field with its default.
    ///
    /// A source must be in the catalog (auto included); a target must be in
    /// the catalog and must not be the auto sentinel.
    fn sanitized(self) -> Self {
        let default = Self::default();

        let source_lang = if catalog::is_known(&self.source_lang) {
            self.source_lang
        } else {
            default.source_lang
        };

        let target_lang =
            if catalog::is_known(&self.target_lang) && self.target_lang != AUTO_UI_CODE {
                self.target_lang
            } else {
                default.target_lang
            };

        Self {
            source_lang,
            target_lang,
        }
    }
}

// ---------------------------------------------------------------------------
// PreferenceStore
// ---------------------------------------------------------------------------

/// Loads and saves [`LanguagePreferences`] at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store backed by the platform-appropriate `preferences.toml`.
    pub fn new() -> Self {
        Self::at(AppPaths::new().preferences_file)
    }

    /// Store backed by an explicit path (useful for tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the persisted preferences, validating every entry against the
    /// language catalog.  Never raises — a missing file, unparsable content,
    /// or an unknown code yields the defaults (`auto` → `en`) field by field.
    pub fn load(&self) -> LanguagePreferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return LanguagePreferences::default(),
        };

        match toml::from_str::<LanguagePreferences>(&content) {
            Ok(prefs) => prefs.sanitized(),
            Err(e) => {
                log::warn!(
                    "preferences: ignoring corrupt {} ({e})",
                    self.path.display()
                );
                LanguagePreferences::default()
            }
        }
    }

    /// Persist `prefs`, creating parent directories as needed.
    ///
    /// Best-effort: a persistence failure is logged and swallowed, since
    /// preferences are a convenience rather than correctness-critical state.
    pub fn save(&self, prefs: &LanguagePreferences) {
        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(prefs)?;
            std::fs::write(&self.path, content)?;
            Ok(())
        })();

        if let Err(e) = result {
            log::warn!("preferences: failed to save {} ({e})", self.path.display());
        }
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempdir().expect("temp dir");
        let store = PreferenceStore::at(dir.path().join("preferences.toml"));

        let prefs = store.load();
        assert_eq!(prefs, LanguagePreferences::default());
        assert_eq!(prefs.source_lang, "auto");
        assert_eq!(prefs.target_lang, "en");
    }

    #[test]
    fn round_trip() {
        let dir = tempdir().expect("temp dir");
        let store = PreferenceStore::at(dir.path().join("preferences.toml"));

        let prefs = LanguagePreferences {
            source_lang: "es".into(),
            target_lang: "fr".into(),
        };
        store.save(&prefs);

        assert_eq!(store.load(), prefs);
    }

    /// Corrupt TOML must fall back to the defaults, never raise.
    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "not = [valid").expect("write");

        let store = PreferenceStore::at(path);
        assert_eq!(store.load(), LanguagePreferences::default());
    }

    /// Codes outside the catalog are replaced field by field.
    #[test]
    fn unknown_codes_fall_back_per_field() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("preferences.toml");
        std::fs::write(
            &path,
            "source_lang = \"es\"\ntarget_lang = \"klingon\"\n",
        )
        .expect("write");

        let prefs = PreferenceStore::at(path).load();
        assert_eq!(prefs.source_lang, "es"); // valid entry kept
        assert_eq!(prefs.target_lang, "en"); // invalid entry defaulted
    }

    /// `"auto"` is never a valid persisted target.
    #[test]
    fn auto_target_is_rejected_on_load() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "source_lang = \"auto\"\ntarget_lang = \"auto\"\n")
            .expect("write");

        let prefs = PreferenceStore::at(path).load();
        assert_eq!(prefs.source_lang, "auto");
        assert_eq!(prefs.target_lang, "en");
    }

    /// Saving into a path whose parent cannot be created must not panic.
    #[test]
    fn save_failure_is_swallowed() {
        let dir = tempdir().expect("temp dir");
        // A file where a directory is expected makes create_dir_all fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").expect("write");

        let store = PreferenceStore::at(blocker.join("preferences.toml"));
        store.save(&LanguagePreferences::default()); // must not panic
    }
}
