//! Speech Translator — record speech, translate it, play it back.
//!
//! # Architecture
//!
//! ```text
//! Microphone → cpal callback → SampleBuffer ─┐
//!                                            │ stop()
//!                    RecordingController ────┴─▶ RecordedArtifact (WAV)
//!                          │ start/stop                  │
//!                          ▼                             ▼
//!                    VisualizationLoop        SessionOrchestrator
//!                                                │ multipart POST
//!                                                ▼
//!                                     remote speech-to-speech service
//!                                                │ translatedText + audioUrl
//!                                                ▼
//!                                   MediaStore → PlayableHandle → Player
//! ```
//!
//! The orchestrator lives in [`session`]; everything else is a supporting
//! subsystem with its own error type.  The egui widget in [`app`] only reads
//! [`session::SharedSession`] and sends [`session::SessionCommand`]s.

pub mod app;
pub mod audio;
pub mod config;
pub mod lang;
pub mod media;
pub mod session;
pub mod translate;
