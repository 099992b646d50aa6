//! Session orchestrator — drives the record → translate → play loop.
//!
//! [`SessionOrchestrator`] owns the [`SharedSession`] and responds to
//! [`SessionCommand`]s received over a `tokio::sync::mpsc` channel, emitting
//! [`SessionEvent`]s for anything the UI wants to react to.
//!
//! # Request flow
//!
//! ```text
//! SessionCommand::StopRecording            SessionCommand::IngestFile
//!   └─▶ drain capture → WAV artifact         └─▶ read file → artifact
//!         └─▶ local input handle ◀───────────────┘
//!               └─▶ (auto-translate?) SessionCommand::Translate
//!
//! SessionCommand::Translate
//!   └─▶ gate: Ready + artifact present + target resolvable
//!       progress 20 → 40 → translator.translate_speech (async)
//!         ├─ Ok  → 70 → 90 → store texts, remote output handle,
//!         │        drop artifact, 100 → (auto-play?)       [Ready]
//!         └─ Err → error banner, artifact kept for retry   [Ready]
//! ```
//!
//! At most one request is in flight: the `Translating` phase is set under
//! the state lock before the first await, so a concurrent `Translate` sees
//! it and is rejected.  Recording stays available during a request.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{RecordedArtifact, RecordingController};
use crate::config::AppConfig;
use crate::lang::{catalog, PreferenceStore};
use crate::media::{MediaStore, PlayableHandle, Player};
use crate::translate::{resolve_audio_url, SpeechTranslator};

use super::progress::ProgressStage;
use super::state::{SessionPhase, SharedSession};

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Everything the UI can ask the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    StartRecording,
    StopRecording,
    /// Discard the pending recording and the last result.
    Clear,
    Translate,
    /// Load an audio file from disk as the pending artifact.
    IngestFile(std::path::PathBuf),
    /// Translate typed text instead of a recording.
    TranslateText(String),
    PlayTranslated,
    SetSourceLang(String),
    SetTargetLang(String),
    SetAutoTranslate(bool),
    SetAutoPlay(bool),
}

/// Notifications emitted back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RecordingStarted,
    RecordingStopped,
    Progress { stage: ProgressStage },
    TranslationComplete { translated_text: String },
    TranslationFailed { message: String },
    PlaybackStarted,
    PlaybackFailed { message: String },
}

// ---------------------------------------------------------------------------
// SessionOpError
// ---------------------------------------------------------------------------

/// Precondition failures of session operations.
///
/// These are also surfaced on the session error banner; the `Result` exists
/// so callers can distinguish "did not start" from "started and failed".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionOpError {
    #[error("nothing to translate — record or load some audio first")]
    NoAudioSupplied,

    #[error("a translation is already in progress")]
    RequestInFlight,

    #[error("unknown language: {0}")]
    UnknownLanguage(String),
}

// ---------------------------------------------------------------------------
// SessionOrchestrator
// ---------------------------------------------------------------------------

/// Drives one translation session.
///
/// Create with [`SessionOrchestrator::new`], wrap in an `Arc`, then call
/// [`run`](Self::run) inside a tokio task.  All methods take `&self`; the
/// mutable pieces live behind their own locks so an in-flight translation
/// never blocks recording.
pub struct SessionOrchestrator {
    state: SharedSession,
    recorder: Mutex<RecordingController>,
    media: Mutex<MediaStore>,
    translator: Arc<dyn SpeechTranslator>,
    player: Arc<dyn Player>,
    prefs_store: PreferenceStore,
    /// Service base, used to resolve relative audio references.
    base_url: String,
    /// How long the finished progress bar stays visible.
    progress_hold: Duration,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: SharedSession,
        recorder: RecordingController,
        media: MediaStore,
        translator: Arc<dyn SpeechTranslator>,
        player: Arc<dyn Player>,
        prefs_store: PreferenceStore,
        config: &AppConfig,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            state,
            recorder: Mutex::new(recorder),
            media: Mutex::new(media),
            translator,
            player,
            prefs_store,
            base_url: config.service.base_url.clone(),
            progress_hold: Duration::from_millis(config.session.progress_hold_ms),
            event_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `command_rx` is closed.
    ///
    /// Spawn as a tokio task from `main()`; it never returns while the
    /// channel is open.
    pub async fn run(self: Arc<Self>, mut command_rx: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                SessionCommand::StartRecording => self.start_recording().await,
                SessionCommand::StopRecording => self.stop_recording().await,
                SessionCommand::Clear => self.clear(),
                SessionCommand::Translate => {
                    let _ = self.translate().await;
                }
                SessionCommand::IngestFile(path) => self.ingest_file(&path).await,
                SessionCommand::TranslateText(text) => {
                    let _ = self.translate_text_input(&text).await;
                }
                SessionCommand::PlayTranslated => self.play_translated().await,
                SessionCommand::SetSourceLang(code) => {
                    let _ = self.set_source_lang(&code);
                }
                SessionCommand::SetTargetLang(code) => {
                    let _ = self.set_target_lang(&code);
                }
                SessionCommand::SetAutoTranslate(on) => self.set_auto_translate(on),
                SessionCommand::SetAutoPlay(on) => self.set_auto_play(on),
            }
        }

        log::info!("session: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Begin capturing microphone audio.  Failures land on the error banner.
    pub async fn start_recording(&self) {
        let result = self.recorder.lock().unwrap().start();
        match result {
            Ok(()) => {
                let _ = self.event_tx.send(SessionEvent::RecordingStarted).await;
            }
            Err(e) => self.report(e.to_string()),
        }
    }

    /// Finish the capture: encode the artifact, expose it as a playable
    /// input handle, and kick off auto-translate when enabled.
    pub async fn stop_recording(&self) {
        let result = {
            let mut recorder = self.recorder.lock().unwrap();
            let result = recorder.stop();
            // Back to Idle so the next capture can start immediately.
            recorder.reset();
            result
        };

        let artifact = match result {
            Ok(artifact) => artifact,
            Err(e) => {
                self.report(e.to_string());
                return;
            }
        };

        if let Err(e) = self.install_artifact(artifact) {
            self.report(format!("Failed to store recording: {e}"));
            return;
        }

        let _ = self.event_tx.send(SessionEvent::RecordingStopped).await;

        let auto_translate = self.state.lock().unwrap().auto_translate;
        if auto_translate {
            let _ = self.translate().await;
        }
    }

    /// Load a user-supplied audio file as the pending artifact.
    pub async fn ingest_file(&self, path: &std::path::Path) {
        match RecordedArtifact::from_file(path) {
            Ok(artifact) => {
                if let Err(e) = self.install_artifact(artifact) {
                    self.report(format!("Failed to store audio file: {e}"));
                    return;
                }
                let _ = self.event_tx.send(SessionEvent::RecordingStopped).await;

                let auto_translate = self.state.lock().unwrap().auto_translate;
                if auto_translate {
                    let _ = self.translate().await;
                }
            }
            Err(e) => self.report(e.to_string()),
        }
    }

    /// Store `artifact` as the pending recording and replace the input
    /// handle, releasing the previous clip.
    fn install_artifact(&self, artifact: RecordedArtifact) -> Result<(), crate::media::MediaError> {
        let ext = if artifact.mime == "audio/wav" { "wav" } else { "bin" };
        let handle = self.media.lock().unwrap().wrap_local(&artifact.bytes, ext)?;

        let mut st = self.state.lock().unwrap();
        if let Some(old) = st.input_handle.take() {
            self.media.lock().unwrap().release(&old);
        }
        st.input_handle = Some(handle);
        st.pending_artifact = Some(artifact);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Translation
    // -----------------------------------------------------------------------

    /// Run one speech translation request against the pending artifact.
    ///
    /// Preconditions (reported on the banner and returned as `Err`):
    /// no request already in flight, an artifact present, and a target
    /// language that resolves to a concrete wire code.
    ///
    /// On success the artifact is dropped; on failure it is kept so the user
    /// can retry without re-recording.
    pub async fn translate(&self) -> Result<(), SessionOpError> {
        // Gate and snapshot under one short lock.
        let (artifact, source_ui, source_wire, target_wire) = {
            let mut st = self.state.lock().unwrap();

            if st.phase.is_translating() {
                drop(st);
                self.report(SessionOpError::RequestInFlight.to_string());
                return Err(SessionOpError::RequestInFlight);
            }

            let Some(artifact) = st.pending_artifact.clone() else {
                drop(st);
                self.report(SessionOpError::NoAudioSupplied.to_string());
                return Err(SessionOpError::NoAudioSupplied);
            };

            let source_ui = st.prefs.source_lang.clone();
            let Some(source_wire) = catalog::resolve(&source_ui) else {
                let err = SessionOpError::UnknownLanguage(source_ui.clone());
                drop(st);
                self.report(err.to_string());
                return Err(err);
            };

            let target_ui = st.prefs.target_lang.clone();
            let target_wire = match catalog::resolve(&target_ui) {
                Some(wire) if target_ui != catalog::AUTO_UI_CODE => wire,
                _ => {
                    let err = SessionOpError::UnknownLanguage(target_ui);
                    drop(st);
                    self.report(err.to_string());
                    return Err(err);
                }
            };

            // Only a request that actually starts clears the previous
            // banner; a rejected attempt leaves its own message instead.
            st.errors.clear();
            st.phase = SessionPhase::Translating;
            st.progress.advance(ProgressStage::Transcribing);
            (artifact, source_ui, source_wire, target_wire)
        };

        self.emit_progress(ProgressStage::Transcribing).await;

        self.advance(ProgressStage::Submitting);
        self.emit_progress(ProgressStage::Submitting).await;

        log::info!("session: translating {source_wire} → {target_wire}");
        let result = self
            .translator
            .translate_speech(&artifact, source_wire, target_wire)
            .await;

        match result {
            Ok(translation) => {
                self.advance(ProgressStage::Generating);
                self.emit_progress(ProgressStage::Generating).await;
                self.advance(ProgressStage::Completing);
                self.emit_progress(ProgressStage::Completing).await;

                let output_url = resolve_audio_url(&self.base_url, &translation.audio_url);
                let output_handle = self.media.lock().unwrap().wrap_remote(output_url);

                {
                    let mut st = self.state.lock().unwrap();
                    st.translated_text = Some(translation.translated_text.clone());
                    st.original_text = translation.original_text.clone();
                    // Detection is only meaningful when the user asked for it.
                    st.detected_lang = if source_ui == catalog::AUTO_UI_CODE {
                        translation.detected_lang.clone()
                    } else {
                        None
                    };

                    if let Some(old) = st.output_handle.replace(output_handle) {
                        self.media.lock().unwrap().release(&old);
                    }

                    // Successful hand-off: the recording is spent.
                    st.pending_artifact = None;
                    st.progress.advance(ProgressStage::Done);
                }

                self.emit_progress(ProgressStage::Done).await;
                let _ = self
                    .event_tx
                    .send(SessionEvent::TranslationComplete {
                        translated_text: translation.translated_text,
                    })
                    .await;

                let auto_play = self.state.lock().unwrap().auto_play;
                if auto_play {
                    self.play_translated().await;
                }
            }
            Err(e) => {
                // The artifact stays pending so the user can retry.
                let message = format!("Translation failed: {e}");
                self.report(message.clone());
                let _ = self
                    .event_tx
                    .send(SessionEvent::TranslationFailed { message })
                    .await;
            }
        }

        // Let the finished (or failed) bar linger before resetting.
        tokio::time::sleep(self.progress_hold).await;
        {
            let mut st = self.state.lock().unwrap();
            st.progress.clear();
            st.phase = SessionPhase::Ready;
        }

        Ok(())
    }

    /// Translate typed text.  Shares the in-flight gate with speech
    /// translation but produces no audio output.
    pub async fn translate_text_input(&self, text: &str) -> Result<(), SessionOpError> {
        let (source_wire, target_wire) = {
            let mut st = self.state.lock().unwrap();

            if st.phase.is_translating() {
                drop(st);
                self.report(SessionOpError::RequestInFlight.to_string());
                return Err(SessionOpError::RequestInFlight);
            }

            let source_wire = match catalog::resolve(&st.prefs.source_lang) {
                Some(wire) => wire,
                None => {
                    let err = SessionOpError::UnknownLanguage(st.prefs.source_lang.clone());
                    drop(st);
                    self.report(err.to_string());
                    return Err(err);
                }
            };
            let target_ui = st.prefs.target_lang.clone();
            let target_wire = match catalog::resolve(&target_ui) {
                Some(wire) if target_ui != catalog::AUTO_UI_CODE => wire,
                _ => {
                    let err = SessionOpError::UnknownLanguage(target_ui);
                    drop(st);
                    self.report(err.to_string());
                    return Err(err);
                }
            };

            st.errors.clear();
            st.phase = SessionPhase::Translating;
            st.progress.advance(ProgressStage::Submitting);
            (source_wire, target_wire)
        };

        self.emit_progress(ProgressStage::Submitting).await;

        match self
            .translator
            .translate_text(text, source_wire, target_wire)
            .await
        {
            Ok(translated) => {
                {
                    let mut st = self.state.lock().unwrap();
                    st.translated_text = Some(translated.clone());
                    st.original_text = Some(text.to_string());
                    st.detected_lang = None;
                    // No synthesized audio for a text request.
                    if let Some(old) = st.output_handle.take() {
                        self.media.lock().unwrap().release(&old);
                    }
                    st.progress.advance(ProgressStage::Done);
                }
                self.emit_progress(ProgressStage::Done).await;
                let _ = self
                    .event_tx
                    .send(SessionEvent::TranslationComplete {
                        translated_text: translated,
                    })
                    .await;
            }
            Err(e) => {
                let message = format!("Translation failed: {e}");
                self.report(message.clone());
                let _ = self
                    .event_tx
                    .send(SessionEvent::TranslationFailed { message })
                    .await;
            }
        }

        tokio::time::sleep(self.progress_hold).await;
        {
            let mut st = self.state.lock().unwrap();
            st.progress.clear();
            st.phase = SessionPhase::Ready;
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Play the synthesized translation, if there is one.
    ///
    /// Playback failures are surfaced on the banner but never touch the
    /// translation result.
    pub async fn play_translated(&self) {
        let handle = self.state.lock().unwrap().output_handle.clone();
        let Some(handle) = handle else {
            self.report("No translated audio to play yet");
            return;
        };

        match self.player.play(&handle).await {
            Ok(()) => {
                log::debug!("session: playback started ({})", handle.location());
                let _ = self.event_tx.send(SessionEvent::PlaybackStarted).await;
            }
            Err(e) => {
                let message = format!("Playback failed: {e}");
                self.report(message.clone());
                let _ = self
                    .event_tx
                    .send(SessionEvent::PlaybackFailed { message })
                    .await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Language selection
    // -----------------------------------------------------------------------

    /// Change the source language.  Persisted immediately; the current
    /// result stays valid (it was produced from the old selection and still
    /// corresponds to its audio).
    pub fn set_source_lang(&self, ui_code: &str) -> Result<(), SessionOpError> {
        if !catalog::is_known(ui_code) {
            let err = SessionOpError::UnknownLanguage(ui_code.to_string());
            self.report(err.to_string());
            return Err(err);
        }

        let prefs = {
            let mut st = self.state.lock().unwrap();
            st.prefs.source_lang = ui_code.to_string();
            st.prefs.clone()
        };
        self.prefs_store.save(&prefs);
        Ok(())
    }

    /// Change the target language.  The last result no longer matches the
    /// selection, so translated text and output audio are invalidated.
    pub fn set_target_lang(&self, ui_code: &str) -> Result<(), SessionOpError> {
        if !catalog::is_known(ui_code) || ui_code == catalog::AUTO_UI_CODE {
            let err = SessionOpError::UnknownLanguage(ui_code.to_string());
            self.report(err.to_string());
            return Err(err);
        }

        let prefs = {
            let mut st = self.state.lock().unwrap();
            st.prefs.target_lang = ui_code.to_string();

            st.translated_text = None;
            st.original_text = None;
            st.detected_lang = None;
            if let Some(old) = st.output_handle.take() {
                self.media.lock().unwrap().release(&old);
            }

            st.prefs.clone()
        };
        self.prefs_store.save(&prefs);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Toggles and reset
    // -----------------------------------------------------------------------

    pub fn set_auto_translate(&self, on: bool) {
        self.state.lock().unwrap().auto_translate = on;
    }

    pub fn set_auto_play(&self, on: bool) {
        self.state.lock().unwrap().auto_play = on;
    }

    /// Reset the session: discard the pending recording, release both
    /// playable handles, and clear result, progress, and errors.
    ///
    /// An in-flight request is not aborted; its result lands normally.
    pub fn clear(&self) {
        self.recorder.lock().unwrap().reset();

        let mut st = self.state.lock().unwrap();
        st.pending_artifact = None;
        st.translated_text = None;
        st.original_text = None;
        st.detected_lang = None;

        let mut media = self.media.lock().unwrap();
        if let Some(handle) = st.input_handle.take() {
            media.release(&handle);
        }
        if let Some(handle) = st.output_handle.take() {
            media.release(&handle);
        }

        st.progress.clear();
        st.errors.clear();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn report(&self, message: impl Into<String>) {
        self.state.lock().unwrap().errors.report(message);
    }

    fn advance(&self, stage: ProgressStage) {
        self.state.lock().unwrap().progress.advance(stage);
    }

    async fn emit_progress(&self, stage: ProgressStage) {
        let _ = self.event_tx.send(SessionEvent::Progress { stage }).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::{new_shared_buffer, SharedSampleBuffer};
    use crate::config::AppConfig;
    use crate::lang::LanguagePreferences;
    use crate::media::PlaybackError;
    use crate::session::state::new_shared_session;
    use crate::translate::{SpeechTranslation, TranslateError};
    use async_trait::async_trait;
    use tempfile::TempDir;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Translator that succeeds with a fixed response and records the wire
    /// codes it was called with.  An optional gate makes the request hang
    /// until released, for in-flight tests.
    struct OkTranslator {
        translated: String,
        audio_url: String,
        detected: Option<String>,
        calls: Mutex<Vec<(String, String)>>,
        gate: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    impl OkTranslator {
        fn new(translated: &str, audio_url: &str) -> Self {
            Self {
                translated: translated.into(),
                audio_url: audio_url.into(),
                detected: None,
                calls: Mutex::new(Vec::new()),
                gate: tokio::sync::Mutex::new(None),
            }
        }

        fn with_detected(mut self, wire: &str) -> Self {
            self.detected = Some(wire.into());
            self
        }

        fn gated(translated: &str, audio_url: &str) -> (Self, tokio::sync::oneshot::Sender<()>) {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let translator = Self {
                gate: tokio::sync::Mutex::new(Some(rx)),
                ..Self::new(translated, audio_url)
            };
            (translator, tx)
        }
    }

    #[async_trait]
    impl SpeechTranslator for OkTranslator {
        async fn translate_speech(
            &self,
            _artifact: &RecordedArtifact,
            source_wire: &str,
            target_wire: &str,
        ) -> Result<SpeechTranslation, TranslateError> {
            self.calls
                .lock()
                .unwrap()
                .push((source_wire.into(), target_wire.into()));

            if let Some(gate) = self.gate.lock().await.take() {
                let _ = gate.await;
            }

            Ok(SpeechTranslation {
                translated_text: self.translated.clone(),
                original_text: Some("hello".into()),
                audio_url: self.audio_url.clone(),
                detected_lang: self.detected.clone(),
            })
        }

        async fn translate_text(
            &self,
            _text: &str,
            source_wire: &str,
            target_wire: &str,
        ) -> Result<String, TranslateError> {
            self.calls
                .lock()
                .unwrap()
                .push((source_wire.into(), target_wire.into()));
            Ok(self.translated.clone())
        }
    }

    /// Translator that always fails the way a 500 from the service looks.
    struct FailTranslator;

    impl FailTranslator {
        fn error() -> TranslateError {
            TranslateError::Status {
                status: 500,
                body: "model unavailable".into(),
            }
        }
    }

    #[async_trait]
    impl SpeechTranslator for FailTranslator {
        async fn translate_speech(
            &self,
            _artifact: &RecordedArtifact,
            _source_wire: &str,
            _target_wire: &str,
        ) -> Result<SpeechTranslation, TranslateError> {
            Err(Self::error())
        }

        async fn translate_text(
            &self,
            _text: &str,
            _source_wire: &str,
            _target_wire: &str,
        ) -> Result<String, TranslateError> {
            Err(Self::error())
        }
    }

    /// Translator whose first request fails like a 500 and whose later
    /// requests succeed, for retry tests.
    struct FailThenOkTranslator {
        translated: String,
        failures_left: Mutex<u32>,
    }

    impl FailThenOkTranslator {
        fn new(translated: &str) -> Self {
            Self {
                translated: translated.into(),
                failures_left: Mutex::new(1),
            }
        }

        fn take_failure(&self) -> bool {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                true
            } else {
                false
            }
        }
    }

    #[async_trait]
    impl SpeechTranslator for FailThenOkTranslator {
        async fn translate_speech(
            &self,
            _artifact: &RecordedArtifact,
            _source_wire: &str,
            _target_wire: &str,
        ) -> Result<SpeechTranslation, TranslateError> {
            if self.take_failure() {
                return Err(FailTranslator::error());
            }
            Ok(SpeechTranslation {
                translated_text: self.translated.clone(),
                original_text: None,
                audio_url: "/out/retry.wav".into(),
                detected_lang: None,
            })
        }

        async fn translate_text(
            &self,
            _text: &str,
            _source_wire: &str,
            _target_wire: &str,
        ) -> Result<String, TranslateError> {
            if self.take_failure() {
                return Err(FailTranslator::error());
            }
            Ok(self.translated.clone())
        }
    }

    /// Player that records every handle it is asked to play.
    struct MockPlayer {
        plays: Mutex<Vec<PlayableHandle>>,
        fail: bool,
    }

    impl MockPlayer {
        fn new() -> Self {
            Self {
                plays: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                plays: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Player for MockPlayer {
        async fn play(&self, handle: &PlayableHandle) -> Result<(), PlaybackError> {
            self.plays.lock().unwrap().push(handle.clone());
            if self.fail {
                Err(PlaybackError::Output("no output device".into()))
            } else {
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        orc: Arc<SessionOrchestrator>,
        state: SharedSession,
        buffer: SharedSampleBuffer,
        events: mpsc::Receiver<SessionEvent>,
        _dir: TempDir,
    }

    impl Harness {
        /// Feed one second of capture and leave a pending artifact behind.
        async fn record_something(&self) {
            self.orc.start_recording().await;
            self.buffer.lock().unwrap().push(&vec![0.1_f32; 16_000]);
            self.orc.stop_recording().await;
        }

        fn drain_events(&mut self) -> Vec<SessionEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn make_harness(
        translator: Arc<dyn SpeechTranslator>,
        player: Arc<dyn Player>,
    ) -> Harness {
        let dir = TempDir::new().expect("temp dir");

        let mut config = AppConfig::default();
        // Tests do not want the post-request cool-down.
        config.session.progress_hold_ms = 0;

        let buffer = new_shared_buffer();
        buffer.lock().unwrap().set_format(16_000, 1);
        let recorder = RecordingController::new(Arc::clone(&buffer), true);

        let media = MediaStore::at(dir.path().join("media"));
        let prefs_store = PreferenceStore::at(dir.path().join("preferences.toml"));
        let state = new_shared_session(LanguagePreferences::default());

        let (event_tx, events) = mpsc::channel(64);
        let orc = Arc::new(SessionOrchestrator::new(
            Arc::clone(&state),
            recorder,
            media,
            translator,
            player,
            prefs_store,
            &config,
            event_tx,
        ));

        Harness {
            orc,
            state,
            buffer,
            events,
            _dir: dir,
        }
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    /// Record → translate → result lands with a resolved remote handle and
    /// the artifact spent.
    #[tokio::test]
    async fn record_translate_happy_path() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let mut h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        h.record_something().await;
        {
            let st = h.state.lock().unwrap();
            assert!(st.pending_artifact.is_some());
            assert!(st.input_handle.is_some());
        }

        h.orc.translate().await.expect("translate");

        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Ready);
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert_eq!(st.original_text.as_deref(), Some("hello"));
        assert!(st.pending_artifact.is_none(), "artifact spent on success");
        assert!(!st.progress.is_active(), "progress cleared after hold");

        // Relative audioUrl resolved against the service base.
        let output = st.output_handle.as_ref().expect("output handle");
        assert_eq!(output.url(), Some("http://localhost:5000/out/1.wav"));

        // Default prefs: auto → en.
        let calls = translator.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("auto".into(), "eng_Latn".into())]);

        drop(st);
        let events = h.drain_events();
        assert!(events.contains(&SessionEvent::TranslationComplete {
            translated_text: "hola".into()
        }));
    }

    /// Progress events arrive in stage order with monotonic percentages.
    #[tokio::test]
    async fn progress_stages_are_ordered() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let mut h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");

        let percents: Vec<u8> = h
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Progress { stage } => Some(stage.percent()),
                _ => None,
            })
            .collect();

        assert_eq!(percents, vec![20, 40, 70, 90, 100]);
    }

    /// Detection is kept only when the source selection was automatic.
    #[tokio::test]
    async fn detected_lang_only_with_auto_source() {
        let translator =
            Arc::new(OkTranslator::new("hola", "/out/1.wav").with_detected("fra_Latn"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");
        assert_eq!(
            h.state.lock().unwrap().detected_lang.as_deref(),
            Some("fra_Latn")
        );

        // Explicit source: detection result is ignored.
        h.orc.set_source_lang("es").expect("set source");
        h.record_something().await;
        h.orc.translate().await.expect("translate");
        assert!(h.state.lock().unwrap().detected_lang.is_none());
    }

    // -----------------------------------------------------------------------
    // Failure path
    // -----------------------------------------------------------------------

    /// A failed request keeps the artifact for retry and surfaces the error.
    #[tokio::test]
    async fn failure_keeps_artifact_and_reports() {
        let mut h = make_harness(Arc::new(FailTranslator), Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("request ran");

        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Ready);
        assert!(st.pending_artifact.is_some(), "artifact kept for retry");
        assert!(st.translated_text.is_none());
        assert!(st.output_handle.is_none());
        let banner = st.errors.visible().expect("error visible");
        assert!(banner.message.contains("500"));
        assert!(banner.message.contains("model unavailable"));

        drop(st);
        assert!(h
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::TranslationFailed { .. })));
    }

    /// The failure banner survives until a retry actually starts, then the
    /// retry's success replaces it with a result.
    #[tokio::test]
    async fn retry_clears_previous_error() {
        let h = make_harness(
            Arc::new(FailThenOkTranslator::new("hola")),
            Arc::new(MockPlayer::new()),
        );

        h.record_something().await;
        h.orc.translate().await.expect("first attempt ran");
        {
            let st = h.state.lock().unwrap();
            assert!(st.errors.visible().is_some(), "failure on the banner");
            assert!(st.pending_artifact.is_some(), "artifact kept for retry");
        }

        h.orc.translate().await.expect("retry");

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert!(st.errors.visible().is_none(), "banner cleared by the retry");
    }

    /// A rejected attempt reports its own message; it never starts a
    /// request, so it does not blank an unrelated banner first.
    #[tokio::test]
    async fn rejected_attempt_replaces_banner() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        h.orc.play_translated().await; // leaves "nothing to play" on the banner
        let err = h.orc.translate().await.expect_err("no artifact");
        assert_eq!(err, SessionOpError::NoAudioSupplied);

        let st = h.state.lock().unwrap();
        let banner = st.errors.visible().expect("banner still populated");
        assert_eq!(banner.message, SessionOpError::NoAudioSupplied.to_string());
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    /// Translate with nothing recorded is rejected up front, before any
    /// network exchange.
    #[tokio::test]
    async fn translate_without_audio_is_rejected() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        let err = h.orc.translate().await.expect_err("must be rejected");
        assert_eq!(err, SessionOpError::NoAudioSupplied);

        let st = h.state.lock().unwrap();
        assert_eq!(st.phase, SessionPhase::Ready);
        assert!(st.errors.visible().is_some());
        assert!(translator.calls.lock().unwrap().is_empty(), "no request sent");
    }

    /// A second translate while one is in flight is rejected without
    /// touching the running request.
    #[tokio::test]
    async fn concurrent_translate_is_rejected() {
        let (translator, gate) = OkTranslator::gated("hola", "/out/1.wav");
        let translator = Arc::new(translator);
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        h.record_something().await;

        let orc = Arc::clone(&h.orc);
        let first = tokio::spawn(async move { orc.translate().await });

        // Wait until the first request is on the wire.
        while translator.calls.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let err = h.orc.translate().await.expect_err("second must fail");
        assert_eq!(err, SessionOpError::RequestInFlight);

        gate.send(()).expect("release gate");
        first.await.expect("join").expect("first succeeds");

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert_eq!(translator.calls.lock().unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Auto flows
    // -----------------------------------------------------------------------

    /// Auto-translate fires on stop; auto-play fires on completion.
    #[tokio::test]
    async fn auto_translate_and_auto_play() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let player = Arc::new(MockPlayer::new());
        let h = make_harness(Arc::clone(&translator) as _, Arc::clone(&player) as _);

        h.orc.set_auto_translate(true);
        h.orc.set_auto_play(true);

        h.record_something().await; // stop triggers the whole chain

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert_eq!(translator.calls.lock().unwrap().len(), 1);

        let plays = player.plays.lock().unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].url(), Some("http://localhost:5000/out/1.wav"));
    }

    /// A playback failure reaches the banner but leaves the result intact.
    #[tokio::test]
    async fn playback_failure_preserves_result() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let mut h = make_harness(translator, Arc::new(MockPlayer::failing()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");
        h.orc.play_translated().await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert!(st.output_handle.is_some());
        assert!(st
            .errors
            .visible()
            .expect("error visible")
            .message
            .contains("Playback failed"));

        drop(st);
        assert!(h
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::PlaybackFailed { .. })));
    }

    /// Play with no result yet reports instead of panicking.
    #[tokio::test]
    async fn play_without_result_reports() {
        let h = make_harness(Arc::new(FailTranslator), Arc::new(MockPlayer::new()));
        h.orc.play_translated().await;
        assert!(h.state.lock().unwrap().errors.visible().is_some());
    }

    // -----------------------------------------------------------------------
    // Language selection
    // -----------------------------------------------------------------------

    /// Changing the target invalidates the stale result and releases the
    /// output handle; the input recording is untouched.
    #[tokio::test]
    async fn target_change_invalidates_result() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");
        assert!(h.state.lock().unwrap().translated_text.is_some());

        h.orc.set_target_lang("es").expect("set target");

        let st = h.state.lock().unwrap();
        assert!(st.translated_text.is_none());
        assert!(st.original_text.is_none());
        assert!(st.output_handle.is_none());
        assert!(st.input_handle.is_some(), "input recording untouched");
        assert_eq!(st.prefs.target_lang, "es");
    }

    /// Source change keeps the current result.
    #[tokio::test]
    async fn source_change_keeps_result() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");

        h.orc.set_source_lang("fr").expect("set source");

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert_eq!(st.prefs.source_lang, "fr");
    }

    /// Selections are persisted as they change.
    #[tokio::test]
    async fn language_changes_are_persisted() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.orc.set_source_lang("es").expect("set source");
        h.orc.set_target_lang("fr").expect("set target");

        let store = PreferenceStore::at(h._dir.path().join("preferences.toml"));
        let prefs = store.load();
        assert_eq!(prefs.source_lang, "es");
        assert_eq!(prefs.target_lang, "fr");
    }

    /// Unknown codes and an auto target are rejected.
    #[tokio::test]
    async fn invalid_language_codes_are_rejected() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        assert!(matches!(
            h.orc.set_source_lang("klingon"),
            Err(SessionOpError::UnknownLanguage(_))
        ));
        assert!(matches!(
            h.orc.set_target_lang("auto"),
            Err(SessionOpError::UnknownLanguage(_))
        ));

        // Prefs untouched by the failed updates.
        let st = h.state.lock().unwrap();
        assert_eq!(st.prefs.source_lang, "auto");
        assert_eq!(st.prefs.target_lang, "en");
    }

    // -----------------------------------------------------------------------
    // Clear and resource lifecycle
    // -----------------------------------------------------------------------

    /// Clear releases both handles and resets every piece of session state.
    #[tokio::test]
    async fn clear_releases_everything() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        h.orc.translate().await.expect("translate");

        let input_path = {
            let st = h.state.lock().unwrap();
            st.input_handle
                .as_ref()
                .and_then(|handle| handle.path())
                .expect("local input")
                .to_path_buf()
        };
        assert!(input_path.exists());

        h.orc.clear();

        let st = h.state.lock().unwrap();
        assert!(st.pending_artifact.is_none());
        assert!(st.input_handle.is_none());
        assert!(st.output_handle.is_none());
        assert!(st.translated_text.is_none());
        assert!(st.errors.visible().is_none());
        assert!(!st.progress.is_active());
        assert!(!input_path.exists(), "input clip deleted");
    }

    /// A new recording replaces the previous input clip exactly once.
    #[tokio::test]
    async fn new_recording_releases_previous_input() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        let first_path = {
            let st = h.state.lock().unwrap();
            st.input_handle
                .as_ref()
                .and_then(|handle| handle.path())
                .expect("local input")
                .to_path_buf()
        };

        h.record_something().await;

        let st = h.state.lock().unwrap();
        let second_path = st
            .input_handle
            .as_ref()
            .and_then(|handle| handle.path())
            .expect("local input")
            .to_path_buf();

        assert_ne!(first_path, second_path);
        assert!(!first_path.exists(), "previous clip released");
        assert!(second_path.exists());
    }

    /// Stopping with an empty capture reports and leaves nothing pending.
    #[tokio::test]
    async fn empty_recording_reports_and_stays_clean() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.orc.start_recording().await;
        h.orc.stop_recording().await; // no samples pushed

        let st = h.state.lock().unwrap();
        assert!(st.pending_artifact.is_none());
        assert!(st.input_handle.is_none());
        assert!(st.errors.visible().is_some());
    }

    // -----------------------------------------------------------------------
    // File ingestion
    // -----------------------------------------------------------------------

    /// A loaded audio file behaves like a finished recording, including the
    /// auto-translate hook.
    #[tokio::test]
    async fn ingested_file_feeds_auto_translate() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let mut h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));
        h.orc.set_auto_translate(true);

        let path = h._dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF fake wav bytes").expect("write clip");

        h.orc.ingest_file(&path).await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert!(st.pending_artifact.is_none(), "artifact spent on success");
        assert!(st.input_handle.is_some());
        assert_eq!(translator.calls.lock().unwrap().len(), 1);

        drop(st);
        assert!(h
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::RecordingStopped)));
    }

    /// Ingesting a file replaces the previous input clip, like a new
    /// recording does.
    #[tokio::test]
    async fn ingested_file_replaces_previous_input() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(translator, Arc::new(MockPlayer::new()));

        h.record_something().await;
        let recorded_path = {
            let st = h.state.lock().unwrap();
            st.input_handle
                .as_ref()
                .and_then(|handle| handle.path())
                .expect("local input")
                .to_path_buf()
        };

        let clip = h._dir.path().join("clip.mp3");
        std::fs::write(&clip, [0_u8; 32]).expect("write clip");
        h.orc.ingest_file(&clip).await;

        let st = h.state.lock().unwrap();
        assert!(!recorded_path.exists(), "previous clip released");
        assert_eq!(
            st.pending_artifact.as_ref().map(|a| a.mime.as_str()),
            Some("audio/mpeg")
        );
    }

    /// An unrecognised file lands on the banner and leaves nothing pending.
    #[tokio::test]
    async fn ingest_of_unsupported_file_reports() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        let path = h._dir.path().join("notes.txt");
        std::fs::write(&path, b"not audio").expect("write file");

        h.orc.ingest_file(&path).await;

        let st = h.state.lock().unwrap();
        assert!(st.pending_artifact.is_none());
        assert!(st.input_handle.is_none());
        assert!(st.errors.visible().is_some());
        assert!(translator.calls.lock().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Text translation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn text_translation_sets_result_without_audio() {
        let translator = Arc::new(OkTranslator::new("bonjour", "unused"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        h.orc.set_target_lang("fr").expect("set target");
        h.orc
            .translate_text_input("hello")
            .await
            .expect("translate text");

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("bonjour"));
        assert_eq!(st.original_text.as_deref(), Some("hello"));
        assert!(st.output_handle.is_none());
        assert_eq!(st.phase, SessionPhase::Ready);
    }

    // -----------------------------------------------------------------------
    // Command loop
    // -----------------------------------------------------------------------

    /// The run loop dispatches commands end to end.
    #[tokio::test]
    async fn run_loop_dispatches_commands() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        let (tx, rx) = mpsc::channel(16);
        let loop_task = tokio::spawn(Arc::clone(&h.orc).run(rx));

        tx.send(SessionCommand::StartRecording).await.unwrap();
        // Wait until the loop has armed the capture buffer.
        while !h.buffer.lock().unwrap().is_armed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        h.buffer.lock().unwrap().push(&vec![0.1_f32; 16_000]);
        tx.send(SessionCommand::StopRecording).await.unwrap();
        tx.send(SessionCommand::Translate).await.unwrap();
        drop(tx); // close channel so run() returns

        loop_task.await.expect("loop join");

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
    }

    /// File ingestion goes through the same loop (the UI sends it for
    /// dropped files).
    #[tokio::test]
    async fn run_loop_dispatches_file_ingestion() {
        let translator = Arc::new(OkTranslator::new("hola", "/out/1.wav"));
        let h = make_harness(Arc::clone(&translator) as _, Arc::new(MockPlayer::new()));

        let clip = h._dir.path().join("clip.wav");
        std::fs::write(&clip, b"RIFF fake wav bytes").expect("write clip");

        let (tx, rx) = mpsc::channel(16);
        tx.send(SessionCommand::IngestFile(clip)).await.unwrap();
        tx.send(SessionCommand::Translate).await.unwrap();
        drop(tx);

        Arc::clone(&h.orc).run(rx).await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.translated_text.as_deref(), Some("hola"));
        assert_eq!(translator.calls.lock().unwrap().len(), 1);
    }
}
