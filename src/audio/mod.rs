//! Audio subsystem — microphone capture, recording state machine, and the
//! recording visualisation.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → SampleBuffer (armed while Recording)
//!            → RecordingController::stop() → downmix → WAV artifact
//! ```
//!
//! The capture stream is opened once at startup and stays alive; the
//! controller only arms/drains the shared buffer.

pub mod capture;
pub mod recorder;
pub mod waveform;

pub use capture::{
    new_shared_buffer, AudioCapture, CaptureError, SampleBuffer, SharedSampleBuffer, StreamHandle,
};
pub use recorder::{downmix_to_mono, RecordError, RecordState, RecordedArtifact, RecordingController};
pub use waveform::{curve_points, SharedWaveform, VisualizationLoop};
