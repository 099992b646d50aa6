//! Audio playback behind the [`Player`] trait.
//!
//! [`RodioPlayer`] is the production implementation: local clips are read
//! from disk, remote clips are fetched over HTTP, and the bytes are decoded
//! and played through the default output device on the blocking thread pool.
//!
//! `play` resolves once playback has *started* (or failed to start) —
//! the clip then runs to completion in the background.  Start failures are
//! ordinary errors for the caller to surface; they never affect translation
//! state.

use std::io::Cursor;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::handle::PlayableHandle;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while starting playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No output device, or the platform refused to open one.
    #[error("failed to open audio output: {0}")]
    Output(String),

    /// The clip bytes could not be decoded as audio.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// A remote clip could not be fetched.
    #[error("failed to fetch audio: {0}")]
    Fetch(String),

    /// A local clip's backing file could not be read.
    #[error("failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    /// The playback task was cancelled before it could report back.
    #[error("playback task aborted")]
    Aborted,
}

// ---------------------------------------------------------------------------
// Player trait
// ---------------------------------------------------------------------------

/// Async playback seam.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Player>`.
#[async_trait]
pub trait Player: Send + Sync {
    /// Begin playing `handle`, resolving once playback has started.
    async fn play(&self, handle: &PlayableHandle) -> Result<(), PlaybackError>;
}

// ---------------------------------------------------------------------------
// RodioPlayer
// ---------------------------------------------------------------------------

/// Plays clips through the default output device via `rodio`.
pub struct RodioPlayer {
    client: reqwest::Client,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Gather the clip bytes, fetching remote clips over HTTP.
    async fn load_bytes(&self, handle: &PlayableHandle) -> Result<Vec<u8>, PlaybackError> {
        match handle {
            PlayableHandle::Local { path, .. } => Ok(tokio::fs::read(path).await?),
            PlayableHandle::Remote { url } => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| PlaybackError::Fetch(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| PlaybackError::Fetch(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Player for RodioPlayer {
    /// Decode and start playing on the blocking pool; resolve as soon as the
    /// sink has accepted the clip.
    async fn play(&self, handle: &PlayableHandle) -> Result<(), PlaybackError> {
        let bytes = self.load_bytes(handle).await?;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();

        // rodio's OutputStream is not Send, so the whole open → decode →
        // drain sequence lives on one blocking thread.  The oneshot reports
        // start success/failure back before the clip finishes.
        tokio::task::spawn_blocking(move || {
            let started = (|| -> Result<(rodio::OutputStream, rodio::Sink), PlaybackError> {
                let (stream, stream_handle) = rodio::OutputStream::try_default()
                    .map_err(|e| PlaybackError::Output(e.to_string()))?;
                let sink = rodio::Sink::try_new(&stream_handle)
                    .map_err(|e| PlaybackError::Output(e.to_string()))?;
                let source = rodio::Decoder::new(Cursor::new(bytes))
                    .map_err(|e| PlaybackError::Decode(e.to_string()))?;
                sink.append(source);
                Ok((stream, sink))
            })();

            match started {
                Ok((stream, sink)) => {
                    let _ = started_tx.send(Ok(()));
                    sink.sleep_until_end();
                    drop(stream);
                }
                Err(e) => {
                    let _ = started_tx.send(Err(e));
                }
            }
        });

        started_rx.await.map_err(|_| PlaybackError::Aborted)?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
