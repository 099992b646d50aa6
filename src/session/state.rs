//! Shared session state.
//!
//! [`SessionState`] is the single source of truth for everything the UI
//! renders: current phase, language preferences, the pending recording, the
//! last translation result, progress, and the error banner.
//!
//! [`SharedSession`] is a type alias for `Arc<Mutex<SessionState>>` — cheap
//! to clone and safe to share between the orchestrator and the egui update
//! loop.  Lock for short critical sections only; never hold the lock across
//! an `.await`.

use std::sync::{Arc, Mutex};

use crate::audio::RecordedArtifact;
use crate::lang::LanguagePreferences;
use crate::media::PlayableHandle;

use super::error::SessionErrorChannel;
use super::progress::ProgressState;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Coarse phase of the translation session.
///
/// ```text
/// Ready ──translate──▶ Translating ──result / failure──▶ Ready
/// ```
///
/// At most one request is in flight; `Translating` gates re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No request in flight; recording and translation are available.
    #[default]
    Ready,
    /// A translation request is on the wire.
    Translating,
}

impl SessionPhase {
    pub fn is_translating(&self) -> bool {
        matches!(self, SessionPhase::Translating)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything one translation session carries between operations.
pub struct SessionState {
    /// Coarse phase; `Translating` while a request is in flight.
    pub phase: SessionPhase,

    /// Current source/target language selection.
    pub prefs: LanguagePreferences,

    /// Encoded recording awaiting translation.
    ///
    /// Set when a recording stops (or a file is ingested); cleared on
    /// successful hand-off to the service or by an explicit clear.
    pub pending_artifact: Option<RecordedArtifact>,

    /// Playable reference to the most recent input recording.
    pub input_handle: Option<PlayableHandle>,

    /// Translated text from the last completed request.
    pub translated_text: Option<String>,

    /// Transcript of the input audio, when the service provided one.
    pub original_text: Option<String>,

    /// Wire code the service detected, only kept when the source was
    /// automatic detection.
    pub detected_lang: Option<String>,

    /// Playable reference to the synthesized translation.
    pub output_handle: Option<PlayableHandle>,

    /// Staged progress of the in-flight request.
    pub progress: ProgressState,

    /// Error banner.
    pub errors: SessionErrorChannel,

    /// Start translation automatically when a recording stops.
    pub auto_translate: bool,

    /// Play the synthesized audio automatically when a translation lands.
    pub auto_play: bool,
}

impl SessionState {
    pub fn new(prefs: LanguagePreferences) -> Self {
        Self {
            phase: SessionPhase::Ready,
            prefs,
            pending_artifact: None,
            input_handle: None,
            translated_text: None,
            original_text: None,
            detected_lang: None,
            output_handle: None,
            progress: ProgressState::new(),
            errors: SessionErrorChannel::new(),
            auto_translate: false,
            auto_play: false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(LanguagePreferences::default())
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedSession`] with the given preferences.
pub fn new_shared_session(prefs: LanguagePreferences) -> SharedSession {
    Arc::new(Mutex::new(SessionState::new(prefs)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
