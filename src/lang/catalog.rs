//! Static catalog of supported languages.
//!
//! Each entry maps a short UI-facing code (`"en"`) to the wire code the
//! remote NLLB-200 service expects (`"eng_Latn"`).  The table is immutable
//! for the process lifetime; every UI code maps to exactly one wire code.
//!
//! `"auto"` is a valid *source* code whose wire form is the literal
//! auto-detect sentinel understood by the service.  It is never a valid
//! target — [`crate::session::SessionOrchestrator`] rejects it at call time.

// ---------------------------------------------------------------------------
// LanguageEntry
// ---------------------------------------------------------------------------

/// One row of the language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    /// User-facing short code shown in selectors (e.g. `"en"`).
    pub ui_code: &'static str,
    /// Code sent to the remote service (e.g. `"eng_Latn"`).
    pub wire_code: &'static str,
    /// Human-readable display name.
    pub label: &'static str,
}

/// The UI code of the auto-detect pseudo-language.
pub const AUTO_UI_CODE: &str = "auto";

/// All supported languages, auto-detect first.
pub const LANGUAGES: &[LanguageEntry] = &[
    LanguageEntry { ui_code: "auto", wire_code: "auto", label: "Auto-Detect" },
    LanguageEntry { ui_code: "en", wire_code: "eng_Latn", label: "English" },
    LanguageEntry { ui_code: "es", wire_code: "spa_Latn", label: "Spanish" },
    LanguageEntry { ui_code: "fr", wire_code: "fra_Latn", label: "French" },
    LanguageEntry { ui_code: "de", wire_code: "deu_Latn", label: "German" },
    LanguageEntry { ui_code: "it", wire_code: "ita_Latn", label: "Italian" },
    LanguageEntry { ui_code: "pt", wire_code: "por_Latn", label: "Portuguese" },
    LanguageEntry { ui_code: "nl", wire_code: "nld_Latn", label: "Dutch" },
    LanguageEntry { ui_code: "ru", wire_code: "rus_Cyrl", label: "Russian" },
    LanguageEntry { ui_code: "zh", wire_code: "zho_Hans", label: "Chinese (Simplified)" },
    LanguageEntry { ui_code: "ja", wire_code: "jpn_Jpan", label: "Japanese" },
    LanguageEntry { ui_code: "ko", wire_code: "kor_Hang", label: "Korean" },
    LanguageEntry { ui_code: "ar", wire_code: "arb_Arab", label: "Arabic" },
    LanguageEntry { ui_code: "hi", wire_code: "hin_Deva", label: "Hindi" },
    LanguageEntry { ui_code: "th", wire_code: "tha_Thai", label: "Thai" },
    LanguageEntry { ui_code: "vi", wire_code: "vie_Latn", label: "Vietnamese" },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Find the catalog entry for a UI code.
pub fn entry(ui_code: &str) -> Option<&'static LanguageEntry> {
    LANGUAGES.iter().find(|e| e.ui_code == ui_code)
}

/// Resolve a UI code to the wire code the service expects.
///
/// Returns `None` for unknown codes.  `"auto"` resolves to the literal
/// auto-detect sentinel.
pub fn resolve(ui_code: &str) -> Option<&'static str> {
    entry(ui_code).map(|e| e.wire_code)
}

/// Human-readable display name for a UI code.
pub fn label(ui_code: &str) -> Option<&'static str> {
    entry(ui_code).map(|e| e.label)
}

/// Returns `true` when `ui_code` is in the catalog.
pub fn is_known(ui_code: &str) -> bool {
    entry(ui_code).is_some()
}

/// Reverse lookup: display name for a wire code (used to label the detected
/// source language in the UI).
pub fn label_for_wire(wire_code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|e| e.wire_code == wire_code)
        .map(|e| e.label)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Every UI code in the table must resolve to a defined wire code.
    #[test]
    fn resolution_is_total() {
        for e in LANGUAGES {
            let wire = resolve(e.ui_code);
            assert_eq!(wire, Some(e.wire_code), "no wire code for {}", e.ui_code);
            assert!(!e.wire_code.is_empty());
        }
    }

    /// UI codes must be unique — one wire code per UI code.
    #[test]
    fn ui_codes_are_unique() {
        for (i, a) in LANGUAGES.iter().enumerate() {
            for b in &LANGUAGES[i + 1..] {
                assert_ne!(a.ui_code, b.ui_code, "duplicate ui code {}", a.ui_code);
            }
        }
    }

    #[test]
    fn auto_resolves_to_sentinel() {
        assert_eq!(resolve(AUTO_UI_CODE), Some("auto"));
        assert_eq!(label(AUTO_UI_CODE), Some("Auto-Detect"));
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(resolve("xx"), None);
        assert_eq!(label(""), None);
        assert!(!is_known("klingon"));
    }

    #[test]
    fn wire_reverse_lookup() {
        assert_eq!(label_for_wire("spa_Latn"), Some("Spanish"));
        assert_eq!(label_for_wire("xxx_Xxxx"), None);
    }
}
