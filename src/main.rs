//! Application entry point — Speech Translator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the tokio runtime (multi-thread, 2 workers).
//! 4. Open the cpal capture stream feeding the shared sample buffer.
//! 5. Load language preferences and build the shared session.
//! 6. Build the service client, media store and player; spawn the
//!    session orchestrator on the runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use speech_translator::{
    app::TranslatorApp,
    audio::{new_shared_buffer, AudioCapture, RecordingController, StreamHandle},
    config::AppConfig,
    lang::PreferenceStore,
    media::{MediaStore, Player, RodioPlayer},
    session::{new_shared_session, SessionCommand, SessionEvent, SessionOrchestrator},
    translate::{ApiTranslator, SpeechTranslator},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([420.0, 340.0])
        .with_min_inner_size([360.0, 280.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Speech Translator starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (translation requests + playback fetches)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");
    let _rt_guard = rt.enter();

    // 4. cpal capture — the stream stays open for the whole process and only
    //    feeds the buffer while a recording has armed it.
    let buffer = new_shared_buffer();
    let _stream_handle: Option<StreamHandle> =
        match AudioCapture::new(config.audio.input_device.as_deref()) {
            Ok(capture) => match capture.start(Arc::clone(&buffer)) {
                Ok(handle) => {
                    log::info!(
                        "Audio capture started ({} Hz, {} ch)",
                        capture.sample_rate(),
                        capture.channels()
                    );
                    Some(handle)
                }
                Err(e) => {
                    log::warn!("Failed to start audio stream: {e}");
                    None
                }
            },
            Err(e) => {
                log::warn!("Audio capture unavailable: {e}");
                None
            }
        };
    let device_available = _stream_handle.is_some();

    let recorder = RecordingController::new(Arc::clone(&buffer), device_available);
    // Keep a waveform handle for the UI before the controller moves into the
    // orchestrator.
    let waveform = recorder.waveform();

    // 5. Preferences and session state
    let prefs_store = PreferenceStore::new();
    let prefs = prefs_store.load();
    log::info!(
        "Languages: {} → {}",
        prefs.source_lang,
        prefs.target_lang
    );

    let session = new_shared_session(prefs);
    {
        let mut st = session.lock().unwrap();
        st.auto_translate = config.session.auto_translate;
        st.auto_play = config.session.auto_play;
    }

    // 6. Service client, media store, player, orchestrator
    let translator: Arc<dyn SpeechTranslator> =
        Arc::new(ApiTranslator::from_config(&config.service));
    let player: Arc<dyn Player> = Arc::new(RodioPlayer::new());
    let media = MediaStore::new();

    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(32);

    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::clone(&session),
        recorder,
        media,
        translator,
        player,
        prefs_store,
        &config,
        event_tx,
    ));
    rt.spawn(Arc::clone(&orchestrator).run(command_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = TranslatorApp::new(session, waveform, command_tx, event_rx, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Speech Translator",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
