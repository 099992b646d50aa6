//! Recording state machine.
//!
//! [`RecordingController`] wraps the always-on capture stream in an explicit
//! state machine:
//!
//! ```text
//! Idle ──start()──▶ Recording ──stop()──▶ Stopped(artifact)
//!   ▲                   │                      │
//!   └──────reset()──────┴──────────────────────┘
//! ```
//!
//! `start()` arms the shared [`SampleBuffer`]; `stop()` drains it, downmixes
//! to mono and encodes a WAV [`RecordedArtifact`].  Every transition into or
//! out of `Recording` synchronously starts/stops the [`VisualizationLoop`].

use std::io::Cursor;
use std::path::Path;

use thiserror::Error;

use crate::audio::capture::SharedSampleBuffer;
use crate::audio::waveform::{SharedWaveform, VisualizationLoop};

// ---------------------------------------------------------------------------
// RecordedArtifact
// ---------------------------------------------------------------------------

/// A finalized binary audio payload, either captured from the microphone or
/// read from a user-supplied file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedArtifact {
    /// Encoded audio bytes (WAV for microphone captures).
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime: String,
}

impl RecordedArtifact {
    /// Load an artifact from an audio file, inferring the MIME type from the
    /// extension.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnsupportedFile`] for unknown extensions,
    /// [`RecordError::Io`] when the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, RecordError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let mime = match ext.as_str() {
            "wav" => "audio/wav",
            "mp3" => "audio/mpeg",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "webm" => "audio/webm",
            "m4a" => "audio/mp4",
            _ => return Err(RecordError::UnsupportedFile(path.display().to_string())),
        };

        let bytes = std::fs::read(path)?;
        Ok(Self {
            bytes,
            mime: mime.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// RecordError
// ---------------------------------------------------------------------------

/// Errors that can surface from the recording controller.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The platform denied microphone access or has no capture device.
    #[error("no microphone available — check that a capture device is connected")]
    DeviceUnavailable,

    /// `start()` was called outside the `Idle` state.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// `stop()` was called outside the `Recording` state.
    #[error("no recording is in progress")]
    NotRecording,

    /// The capture buffer was empty when the recording stopped.
    #[error("nothing was recorded — the microphone produced no samples")]
    EmptyRecording,

    /// WAV encoding failed.
    #[error("failed to encode recording: {0}")]
    Encode(String),

    /// The supplied file has an unrecognised audio extension.
    #[error("unsupported audio file: {0}")]
    UnsupportedFile(String),

    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// RecordState
// ---------------------------------------------------------------------------

/// States of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    /// Waiting for the user to start a capture.
    #[default]
    Idle,
    /// The sample buffer is armed and accumulating.
    Recording,
    /// A capture finished and produced an artifact.
    Stopped,
}

// ---------------------------------------------------------------------------
// Downmix
// ---------------------------------------------------------------------------

/// Average interleaved channels down to mono.
///
/// A channel count of 0 or 1 returns the input unchanged.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Encode 16-bit PCM WAV bytes from mono `f32` samples.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RecordError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| RecordError::Encode(e.to_string()))?;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| RecordError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| RecordError::Encode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// RecordingController
// ---------------------------------------------------------------------------

/// Explicit state machine over the shared capture buffer.
///
/// One controller exists per session.  It owns the [`VisualizationLoop`] and
/// notifies it synchronously on every transition into or out of `Recording`.
pub struct RecordingController {
    buffer: SharedSampleBuffer,
    viz: VisualizationLoop,
    state: RecordState,
    /// Whether an input stream was successfully opened at startup.
    device_available: bool,
}

impl RecordingController {
    /// Number of columns rendered by the visualisation.
    const VIZ_POINTS: usize = 48;

    /// Create a controller over `buffer`.
    ///
    /// `device_available` reflects whether [`crate::audio::AudioCapture`]
    /// managed to open an input stream; when `false`, every `start()` fails
    /// with [`RecordError::DeviceUnavailable`].
    pub fn new(buffer: SharedSampleBuffer, device_available: bool) -> Self {
        Self {
            buffer,
            viz: VisualizationLoop::new(Self::VIZ_POINTS),
            state: RecordState::Idle,
            device_available,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordState::Recording
    }

    /// Visualisation curve handle for the UI.
    pub fn waveform(&self) -> SharedWaveform {
        self.viz.curve()
    }

    /// Begin a capture.  Valid only from `Idle`.
    ///
    /// On failure the controller remains `Idle` and the visualisation stays
    /// stopped.
    pub fn start(&mut self) -> Result<(), RecordError> {
        if !self.device_available {
            return Err(RecordError::DeviceUnavailable);
        }
        if self.state != RecordState::Idle {
            return Err(RecordError::AlreadyRecording);
        }

        self.buffer.lock().unwrap().arm();
        self.state = RecordState::Recording;
        self.viz.start();
        log::debug!("recorder: Idle → Recording");
        Ok(())
    }

    /// Finish the capture and encode the artifact.  Valid only from
    /// `Recording`.
    pub fn stop(&mut self) -> Result<RecordedArtifact, RecordError> {
        if self.state != RecordState::Recording {
            return Err(RecordError::NotRecording);
        }

        let (samples, sample_rate, channels) = {
            let mut buf = self.buffer.lock().unwrap();
            buf.disarm();
            (buf.drain(), buf.sample_rate(), buf.channels())
        };
        self.viz.stop();

        if samples.is_empty() {
            self.state = RecordState::Idle;
            return Err(RecordError::EmptyRecording);
        }

        let mono = downmix_to_mono(&samples, channels);
        let bytes = encode_wav(&mono, sample_rate)?;

        self.state = RecordState::Stopped;
        log::debug!(
            "recorder: Recording → Stopped ({:.1}s, {} bytes)",
            mono.len() as f32 / sample_rate as f32,
            bytes.len()
        );

        Ok(RecordedArtifact {
            bytes,
            mime: "audio/wav".into(),
        })
    }

    /// Return to `Idle` from any state, discarding captured samples.
    ///
    /// If currently `Recording`, capture stops first without emitting an
    /// artifact.
    pub fn reset(&mut self) {
        {
            let mut buf = self.buffer.lock().unwrap();
            buf.disarm();
            buf.clear();
        }
        self.viz.stop();
        self.state = RecordState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::new_shared_buffer;
    use std::sync::Arc;

    fn controller() -> (RecordingController, SharedSampleBuffer) {
        let buf = new_shared_buffer();
        buf.lock().unwrap().set_format(16_000, 1);
        (RecordingController::new(Arc::clone(&buf), true), buf)
    }

    #[tokio::test]
    async fn start_stop_produces_wav_artifact() {
        let (mut rec, buf) = controller();

        rec.start().expect("start");
        assert_eq!(rec.state(), RecordState::Recording);
        assert!(buf.lock().unwrap().is_armed());

        // One second of silence pushed by the "audio callback".
        buf.lock().unwrap().push(&vec![0.0_f32; 16_000]);

        let artifact = rec.stop().expect("stop");
        assert_eq!(rec.state(), RecordState::Stopped);
        assert_eq!(artifact.mime, "audio/wav");
        // RIFF header.
        assert_eq!(&artifact.bytes[..4], b"RIFF");
        // 44-byte header + 16 000 × 2-byte samples.
        assert_eq!(artifact.bytes.len(), 44 + 16_000 * 2);
    }

    #[tokio::test]
    async fn start_without_device_fails_and_stays_idle() {
        let buf = new_shared_buffer();
        let mut rec = RecordingController::new(buf, false);

        let err = rec.start().expect_err("must fail");
        assert!(matches!(err, RecordError::DeviceUnavailable));
        assert_eq!(rec.state(), RecordState::Idle);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (mut rec, _buf) = controller();
        rec.start().expect("start");
        assert!(matches!(rec.start(), Err(RecordError::AlreadyRecording)));
        rec.reset();
    }

    #[tokio::test]
    async fn stop_from_idle_is_rejected() {
        let (mut rec, _buf) = controller();
        assert!(matches!(rec.stop(), Err(RecordError::NotRecording)));
    }

    #[tokio::test]
    async fn stop_with_no_samples_returns_to_idle() {
        let (mut rec, _buf) = controller();
        rec.start().expect("start");
        let err = rec.stop().expect_err("empty capture");
        assert!(matches!(err, RecordError::EmptyRecording));
        assert_eq!(rec.state(), RecordState::Idle);
    }

    #[tokio::test]
    async fn reset_from_recording_discards_samples() {
        let (mut rec, buf) = controller();
        rec.start().expect("start");
        buf.lock().unwrap().push(&[0.5; 512]);

        rec.reset();
        assert_eq!(rec.state(), RecordState::Idle);
        assert!(buf.lock().unwrap().is_empty());
        assert!(!buf.lock().unwrap().is_armed());
    }

    #[tokio::test]
    async fn viz_runs_exactly_while_recording() {
        let (mut rec, buf) = controller();
        let curve = rec.waveform();

        rec.start().expect("start");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(curve.lock().unwrap().iter().any(|&v| v != 0.0));

        buf.lock().unwrap().push(&[0.0; 256]);
        rec.stop().expect("stop");
        assert!(curve.lock().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_mono_is_identity() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples.to_vec());
    }

    #[test]
    fn artifact_from_file_infers_mime() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, [0u8; 8]).expect("write");

        let artifact = RecordedArtifact::from_file(&path).expect("load");
        assert_eq!(artifact.mime, "audio/mpeg");
        assert_eq!(artifact.bytes.len(), 8);
    }

    #[test]
    fn artifact_from_unknown_extension_fails() {
        let err = RecordedArtifact::from_file(Path::new("notes.txt")).expect_err("must fail");
        assert!(matches!(err, RecordError::UnsupportedFile(_)));
    }
}
