//! Speech translator window — egui/eframe application.
//!
//! # Architecture
//!
//! [`TranslatorApp`] is the top-level [`eframe::App`].  It owns two channel
//! endpoints and two shared read handles:
//!
//! * `command_tx` — sends [`SessionCommand`] to the session orchestrator.
//! * `event_rx`   — receives [`SessionEvent`] confirmations back.
//! * `session`    — [`SharedSession`], read each frame to render phase,
//!   result, progress and the error banner.
//! * `waveform`   — the visualisation curve, animated while recording.
//!
//! The UI never mutates session state directly (the one exception is
//! dismissing the error banner); everything else goes through commands so
//! the orchestrator stays the single writer.
//!
//! # Layout
//!
//! | Section | Contents |
//! |---------|----------|
//! | Languages | source / target selectors + detected-language note |
//! | Capture | record toggle, elapsed timer, waveform |
//! | (drop) | audio files dropped onto the window are ingested |
//! | Actions | Translate / Play / Clear + auto toggles |
//! | Text | typed-text translation row |
//! | Result | progress bar while in flight, then translated text |
//! | Banner | dismissable error message |

use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::SharedWaveform;
use crate::config::AppConfig;
use crate::lang::catalog;
use crate::session::{SessionCommand, SessionEvent, SharedSession};

// ---------------------------------------------------------------------------
// TranslatorApp
// ---------------------------------------------------------------------------

/// eframe application — the speech translator window.
pub struct TranslatorApp {
    /// Shared session state written by the orchestrator.
    session: SharedSession,
    /// Visualisation curve, written by the recording controller's loop.
    waveform: SharedWaveform,

    // ── UI-side state ────────────────────────────────────────────────────
    /// Whether the orchestrator confirmed a recording is running.
    is_recording: bool,
    /// When the current recording started (elapsed-time display and the
    /// maximum-length cutoff).
    recording_start: Option<Instant>,
    /// Draft text for the typed-translation row.
    text_input: String,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<SessionCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,

    /// Application configuration (read-only after startup).
    config: AppConfig,
}

impl TranslatorApp {
    pub fn new(
        session: SharedSession,
        waveform: SharedWaveform,
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        config: AppConfig,
    ) -> Self {
        Self {
            session,
            waveform,
            is_recording: false,
            recording_start: None,
            text_input: String::new(),
            command_tx,
            event_rx,
            config,
        }
    }

    fn send(&self, command: SessionCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: command channel full or closed ({e})");
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending orchestrator events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SessionEvent::RecordingStarted => {
                    self.is_recording = true;
                    self.recording_start = Some(Instant::now());
                }
                SessionEvent::RecordingStopped => {
                    self.is_recording = false;
                    self.recording_start = None;
                }
                // Progress, results, failures and playback outcomes are all
                // reflected in SharedSession; nothing extra to track here.
                _ => {}
            }
        }
    }

    /// Forward files dropped onto the window as ingestion commands, so a
    /// saved clip can be translated without recording it first.
    fn poll_dropped_files(&self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                log::info!("ui: file dropped ({})", path.display());
                self.send(SessionCommand::IngestFile(path));
            }
        }
    }

    /// Stop automatically once the capture exceeds the configured maximum.
    fn check_recording_limit(&mut self) {
        if !self.is_recording {
            return;
        }
        if let Some(start) = self.recording_start {
            if start.elapsed().as_secs_f32() >= self.config.audio.max_recording_secs {
                log::info!("ui: maximum recording length reached, stopping");
                self.send(SessionCommand::StopRecording);
            }
        }
    }

    // ── Sections ─────────────────────────────────────────────────────────

    fn draw_language_row(&self, ui: &mut egui::Ui) {
        let (source, target, detected) = {
            let st = self.session.lock().unwrap();
            (
                st.prefs.source_lang.clone(),
                st.prefs.target_lang.clone(),
                st.detected_lang.clone(),
            )
        };

        ui.horizontal(|ui| {
            ui.label("From:");
            egui::ComboBox::from_id_salt("source_lang")
                .selected_text(catalog::label(&source).unwrap_or(&source))
                .show_ui(ui, |ui| {
                    for entry in catalog::LANGUAGES {
                        if ui
                            .selectable_label(source == entry.ui_code, entry.label)
                            .clicked()
                        {
                            self.send(SessionCommand::SetSourceLang(entry.ui_code.into()));
                        }
                    }
                });

            ui.label("To:");
            egui::ComboBox::from_id_salt("target_lang")
                .selected_text(catalog::label(&target).unwrap_or(&target))
                .show_ui(ui, |ui| {
                    for entry in catalog::LANGUAGES {
                        // Auto-detect is a source-only choice.
                        if entry.ui_code == catalog::AUTO_UI_CODE {
                            continue;
                        }
                        if ui
                            .selectable_label(target == entry.ui_code, entry.label)
                            .clicked()
                        {
                            self.send(SessionCommand::SetTargetLang(entry.ui_code.into()));
                        }
                    }
                });
        });

        if let Some(wire) = detected {
            let name = catalog::label_for_wire(&wire).unwrap_or(&wire);
            ui.label(
                egui::RichText::new(format!("Detected: {name}"))
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(11.0),
            );
        }
    }

    fn draw_capture_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.is_recording {
                if ui
                    .button(egui::RichText::new("■ Stop").color(egui::Color32::from_rgb(
                        255, 80, 80,
                    )))
                    .clicked()
                {
                    self.send(SessionCommand::StopRecording);
                }

                let elapsed = self
                    .recording_start
                    .map(|t| t.elapsed().as_secs_f32())
                    .unwrap_or(0.0);
                ui.label(
                    egui::RichText::new(format!("{elapsed:.1}s"))
                        .color(egui::Color32::from_rgb(255, 140, 140)),
                );
            } else if ui.button("● Record").clicked() {
                self.send(SessionCommand::StartRecording);
            }
        });

        if self.is_recording {
            self.draw_waveform(ui);
        }
    }

    fn draw_action_row(&mut self, ui: &mut egui::Ui) {
        let (has_artifact, translating, has_output, auto_translate, auto_play) = {
            let st = self.session.lock().unwrap();
            (
                st.pending_artifact.is_some(),
                st.phase.is_translating(),
                st.output_handle.is_some(),
                st.auto_translate,
                st.auto_play,
            )
        };

        ui.horizontal(|ui| {
            if ui
                .add_enabled(has_artifact && !translating, egui::Button::new("Translate"))
                .clicked()
            {
                self.send(SessionCommand::Translate);
            }
            if ui
                .add_enabled(has_output, egui::Button::new("▶ Play"))
                .clicked()
            {
                self.send(SessionCommand::PlayTranslated);
            }
            if ui.button("Clear").clicked() {
                self.send(SessionCommand::Clear);
            }
        });

        ui.horizontal(|ui| {
            let mut auto_translate = auto_translate;
            if ui.checkbox(&mut auto_translate, "Auto-translate").changed() {
                self.send(SessionCommand::SetAutoTranslate(auto_translate));
            }
            let mut auto_play = auto_play;
            if ui.checkbox(&mut auto_play, "Auto-play").changed() {
                self.send(SessionCommand::SetAutoPlay(auto_play));
            }
        });
    }

    fn draw_text_row(&mut self, ui: &mut egui::Ui) {
        let translating = self.session.lock().unwrap().phase.is_translating();

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.text_input)
                    .hint_text("Type text to translate…")
                    .desired_width(ui.available_width() - 90.0),
            );
            let can_send = !self.text_input.trim().is_empty() && !translating;
            if ui
                .add_enabled(can_send, egui::Button::new("Translate"))
                .clicked()
            {
                let text = self.text_input.trim().to_string();
                self.send(SessionCommand::TranslateText(text));
                self.text_input.clear();
            }
        });
    }

    fn draw_result(&self, ui: &mut egui::Ui) {
        let (progress, translated, original) = {
            let st = self.session.lock().unwrap();
            (
                st.progress.clone(),
                st.translated_text.clone(),
                st.original_text.clone(),
            )
        };

        if let Some(stage) = progress.stage() {
            ui.add(
                egui::ProgressBar::new(stage.percent() as f32 / 100.0)
                    .text(stage.label())
                    .animate(true),
            );
            return;
        }

        if let Some(ref original) = original {
            ui.label(
                egui::RichText::new(original.as_str())
                    .color(egui::Color32::from_rgb(130, 130, 130))
                    .italics()
                    .size(11.0),
            );
        }
        if let Some(ref translated) = translated {
            ui.label(
                egui::RichText::new(translated.as_str())
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(14.0),
            );
        }
    }

    fn draw_error_banner(&self, ui: &mut egui::Ui) {
        let message = {
            let st = self.session.lock().unwrap();
            st.errors.visible().map(|e| e.message.clone())
        };

        let Some(message) = message else {
            return;
        };

        ui.separator();
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(message)
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("x").clicked() {
                    self.session.lock().unwrap().errors.dismiss();
                }
            });
        });
    }

    // ── Waveform helper ──────────────────────────────────────────────────

    /// Draw the animated capture curve as centred vertical bars.
    fn draw_waveform(&self, ui: &mut egui::Ui) {
        let curve = self.waveform.lock().unwrap().clone();

        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 28.0),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let num_bars = curve.len().max(1);
        let bar_width = rect.width() / num_bars as f32;

        for (i, &value) in curve.iter().enumerate() {
            let x = rect.left() + i as f32 * bar_width;
            let bar_height = (value.abs() * rect.height()).max(2.0);

            painter.rect_filled(
                egui::Rect::from_center_size(
                    egui::pos2(x + bar_width / 2.0, rect.center().y),
                    egui::vec2((bar_width * 0.65).max(1.0), bar_height),
                ),
                1.0,
                egui::Color32::from_rgb(80, 200, 120),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for TranslatorApp {
    /// Called every frame by eframe.  Polls channels, checks the recording
    /// cutoff, then renders the window.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.poll_dropped_files(ctx);
        self.check_recording_limit();

        // Repaint while anything is animating.
        let translating = self.session.lock().unwrap().phase.is_translating();
        if self.is_recording || translating {
            ctx.request_repaint_after(Duration::from_millis(33));
        } else {
            // Low-rate poll so orchestrator events are picked up promptly.
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_language_row(ui);
            ui.separator();
            self.draw_capture_row(ui);
            ui.separator();
            self.draw_action_row(ui);
            ui.separator();
            self.draw_text_row(ui);
            ui.separator();
            self.draw_result(ui);
            self.draw_error_banner(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("speech translator closing");
    }
}
