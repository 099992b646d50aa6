//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + language preferences):
//!   Windows: %APPDATA%\speech-translator\
//!   macOS:   ~/Library/Application Support/speech-translator/
//!   Linux:   ~/.config/speech-translator/
//!
//! Data dir (transient media files backing local playable handles):
//!   Windows: %LOCALAPPDATA%\speech-translator\
//!   macOS:   ~/Library/Application Support/speech-translator/
//!   Linux:   ~/.local/share/speech-translator/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `preferences.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Full path to `preferences.toml` (last-chosen languages).
    pub preferences_file: PathBuf,
    /// Directory for transient audio clips written by the media store.
    pub media_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-translator";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let preferences_file = config_dir.join("preferences.toml");
        let media_dir = data_dir.join("media");

        Self {
            config_dir,
            settings_file,
            preferences_file,
            media_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.media_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .preferences_file
            .file_name()
            .is_some_and(|n| n == "preferences.toml"));
    }
}
