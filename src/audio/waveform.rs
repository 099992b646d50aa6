//! Live recording visualisation.
//!
//! [`VisualizationLoop`] is a cancellable repeating task that redraws a
//! time-based waveform while a recording is active.  It is purely cosmetic:
//! the curve is a parametrised animated wave, not a rendering of the actual
//! microphone signal.  What *is* contractual is the lifecycle — the loop is
//! started when the recording controller enters `Recording`, and its pending
//! frame task is cancelled when recording ends.  Telling it to stop more
//! than once is a no-op.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Frame period of the render loop (~60 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shared curve samples in `[-1.0, 1.0]`, one per rendered column.
///
/// The UI reads this each frame; the loop task overwrites it each tick.
pub type SharedWaveform = Arc<Mutex<Vec<f32>>>;

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// Evaluate the animated curve at time `t` (seconds) over `points` columns.
///
/// Two travelling sine components with an edge-fading envelope; values are
/// always within `[-1.0, 1.0]`.
pub fn curve_points(t: f32, points: usize) -> Vec<f32> {
    (0..points)
        .map(|i| {
            let x = i as f32 / points.max(1) as f32;
            // Fade toward both edges so the wave looks anchored.
            let envelope = (x * std::f32::consts::PI).sin();
            let primary = (2.0 * std::f32::consts::TAU * (x - 0.35 * t)).sin();
            let ripple = 0.3 * (5.0 * std::f32::consts::TAU * (x + 0.8 * t)).sin();
            ((primary + ripple) * 0.75 * envelope).clamp(-1.0, 1.0)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// VisualizationLoop
// ---------------------------------------------------------------------------

/// Per-frame render loop bound to the recording state.
///
/// `start()` spawns the repeating task onto the current tokio runtime;
/// `stop()` aborts it and flattens the curve.  Both are idempotent.
pub struct VisualizationLoop {
    curve: SharedWaveform,
    points: usize,
    task: Option<JoinHandle<()>>,
}

impl VisualizationLoop {
    /// A stopped loop rendering `points` columns.
    pub fn new(points: usize) -> Self {
        Self {
            curve: Arc::new(Mutex::new(vec![0.0; points])),
            points,
            task: None,
        }
    }

    /// Handle the UI can read each frame.
    pub fn curve(&self) -> SharedWaveform {
        Arc::clone(&self.curve)
    }

    /// Begin redrawing once per frame.  No-op when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        let curve = Arc::clone(&self.curve);
        let points = self.points;

        self.task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut frames = tokio::time::interval(FRAME_INTERVAL);
            loop {
                frames.tick().await;
                let t = start.elapsed().as_secs_f32();
                if let Ok(mut c) = curve.lock() {
                    *c = curve_points(t, points);
                }
            }
        }));
    }

    /// Cancel the pending frame task and flatten the curve.
    ///
    /// Safe to call any number of times, running or not.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Ok(mut c) = self.curve.lock() {
            c.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Returns `true` while the frame task is scheduled.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for VisualizationLoop {
    fn drop(&mut self) {
        // A leaked frame task would keep ticking forever.
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
