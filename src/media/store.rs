//! Lifecycle management for transient playable audio.
//!
//! [`MediaStore`] is the only creator and destroyer of locally-held
//! [`PlayableHandle`]s.  Each `wrap_local` writes the bytes to a file in the
//! media directory and records its id; `release` deletes the file exactly
//! once — releasing the same handle again, or a remote handle, is a no-op by
//! contract, never an error.  Dropping the store releases everything that is
//! still live, so a session teardown cannot leak clips.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppPaths;
use crate::media::handle::PlayableHandle;

// ---------------------------------------------------------------------------
// MediaError
// ---------------------------------------------------------------------------

/// Errors that can occur while materialising a local clip.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to write media file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// MediaStore
// ---------------------------------------------------------------------------

/// Owns every locally-held playable clip of one session.
#[derive(Debug)]
pub struct MediaStore {
    dir: PathBuf,
    next_id: u64,
    live: HashMap<u64, PathBuf>,
}

impl MediaStore {
    /// Store writing into the platform media directory.
    pub fn new() -> Self {
        Self::at(AppPaths::new().media_dir)
    }

    /// Store writing into an explicit directory (useful for tests).
    pub fn at(dir: PathBuf) -> Self {
        Self {
            dir,
            next_id: 1,
            live: HashMap::new(),
        }
    }

    /// Materialise `bytes` as a locally-held playable clip.
    ///
    /// The backing file is named after a store-assigned id so two clips can
    /// never collide; `ext` should match the audio container ("wav", "mp3").
    pub fn wrap_local(&mut self, bytes: &[u8], ext: &str) -> Result<PlayableHandle, MediaError> {
        std::fs::create_dir_all(&self.dir)?;

        let id = self.next_id;
        self.next_id += 1;

        let path = self.dir.join(format!("clip-{id}.{ext}"));
        std::fs::write(&path, bytes)?;
        self.live.insert(id, path.clone());

        log::debug!("media: wrapped {} bytes as {}", bytes.len(), path.display());
        Ok(PlayableHandle::Local { id, path })
    }

    /// A remotely-hosted handle.  Nothing to track — provided for symmetry.
    pub fn wrap_remote(&self, url: impl Into<String>) -> PlayableHandle {
        PlayableHandle::Remote { url: url.into() }
    }

    /// Release a handle.
    ///
    /// Deletes the backing file of a live local handle; a remote handle or
    /// an already-released local handle is silently ignored.
    pub fn release(&mut self, handle: &PlayableHandle) {
        let PlayableHandle::Local { id, .. } = handle else {
            return;
        };

        if let Some(path) = self.live.remove(id) {
            if let Err(e) = std::fs::remove_file(&path) {
                // The handle is still considered released; the file is gone
                // or unremovable either way.
                log::warn!("media: failed to remove {} ({e})", path.display());
            }
        }
    }

    /// Release every live handle (session teardown).
    pub fn release_all(&mut self) {
        for (_, path) in self.live.drain() {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("media: failed to remove {} ({e})", path.display());
            }
        }
    }

    /// Number of live (unreleased) local handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl Default for MediaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MediaStore {
    fn drop(&mut self) {
        self.release_all();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
