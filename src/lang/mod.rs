//! Language catalog and persisted language preferences.

pub mod catalog;
pub mod prefs;

pub use catalog::{label, label_for_wire, resolve, LanguageEntry, AUTO_UI_CODE, LANGUAGES};
pub use prefs::{LanguagePreferences, PreferenceStore};
