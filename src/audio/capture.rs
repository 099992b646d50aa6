//! Microphone capture via `cpal`.
//!
//! The input stream is opened once at startup and stays alive for the whole
//! process; it feeds interleaved samples into a [`SampleBuffer`] that only
//! accumulates while it is *armed*.  [`crate::audio::RecordingController`]
//! arms the buffer on `start()` and drains it on `stop()`, so the hardware
//! stream never has to be rebuilt per recording.
//!
//! The returned [`StreamHandle`] is a RAII guard — dropping it stops the
//! underlying cpal stream.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Accumulates interleaved `f32` samples from the cpal callback.
///
/// The callback pushes into it on the audio thread; the recording controller
/// arms, disarms and drains it from the session task.  Lock it only for
/// short critical sections.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    armed: bool,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    /// An empty, disarmed buffer with a nominal format.
    ///
    /// The real format is set by [`AudioCapture::start`] once the device
    /// reports its configuration.
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            armed: false,
            sample_rate: 48_000,
            channels: 1,
        }
    }

    /// Begin accumulating; any stale samples are discarded first.
    pub fn arm(&mut self) {
        self.samples.clear();
        self.armed = true;
    }

    /// Stop accumulating.  Already-captured samples stay until drained.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Append samples; ignored while disarmed.
    pub fn push(&mut self, data: &[f32]) {
        if self.armed {
            self.samples.extend_from_slice(data);
        }
    }

    /// Take all accumulated samples, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// Discard accumulated samples without disarming.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate of the feeding stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count of the feeding stream.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Record the format of the stream that feeds this buffer.
    pub fn set_format(&mut self, sample_rate: u32, channels: u16) {
        self.sample_rate = sample_rate;
        self.channels = channels;
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to a [`SampleBuffer`], shared between the cpal
/// callback and the recording controller.
pub type SharedSampleBuffer = Arc<Mutex<SampleBuffer>>;

/// Construct a new [`SharedSampleBuffer`].
pub fn new_shared_buffer() -> SharedSampleBuffer {
    Arc::new(Mutex::new(SampleBuffer::new()))
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device `{0}` not found")]
    DeviceNotFound(String),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use speech_translator::audio::{new_shared_buffer, AudioCapture};
///
/// let buffer = new_shared_buffer();
/// let capture = AudioCapture::new(None).unwrap();
/// let _handle = capture.start(buffer.clone()).unwrap();
/// // Samples flow into `buffer` whenever it is armed; drop `_handle` to
/// // stop the stream.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Create a new [`AudioCapture`] for the named input device, or the
    /// system default when `device_name` is `None`.
    ///
    /// Queries the device's preferred stream configuration (sample rate,
    /// channels, buffer size) so no manual configuration is required.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available,
    /// [`CaptureError::DeviceNotFound`] when the named device does not exist,
    /// or [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.
    pub fn new(device_name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => host
                .input_devices()
                .map_err(|_| CaptureError::NoDevice)?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
        };

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start the input stream, feeding `buffer` whenever it is armed.
    ///
    /// The cpal callback runs on a dedicated audio thread; lock contention is
    /// kept minimal because the controller only holds the buffer lock for
    /// short drain/arm operations.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(&self, buffer: SharedSampleBuffer) -> Result<StreamHandle, CaptureError> {
        buffer
            .lock()
            .unwrap()
            .set_format(self.sample_rate, self.channels);

        let cb_buffer = Arc::clone(&buffer);
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = cb_buffer.lock() {
                    buf.push(data);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels delivered by the device.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
