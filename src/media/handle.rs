//! Opaque references to playable audio.
//!
//! A [`PlayableHandle`] points at audio bytes a [`crate::media::Player`] can
//! consume.  Locally-held handles are backed by a file written by the
//! [`crate::media::MediaStore`] and must be released through it exactly
//! once; remotely-hosted handles carry a URL and need no release.

use std::path::PathBuf;

/// An opaque reference to playable audio bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableHandle {
    /// Locally-held clip written by the media store.  Released through
    /// [`crate::media::MediaStore::release`].
    Local {
        /// Store-assigned identity, used to guarantee exactly-once release.
        id: u64,
        /// Backing file on disk.
        path: PathBuf,
    },
    /// Remotely-hosted clip.  No release required.
    Remote {
        /// Absolute URL of the audio.
        url: String,
    },
}

impl PlayableHandle {
    pub fn is_local(&self) -> bool {
        matches!(self, PlayableHandle::Local { .. })
    }

    /// URL of a remote handle.
    pub fn url(&self) -> Option<&str> {
        match self {
            PlayableHandle::Remote { url } => Some(url),
            PlayableHandle::Local { .. } => None,
        }
    }

    /// Backing path of a local handle.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            PlayableHandle::Local { path, .. } => Some(path),
            PlayableHandle::Remote { .. } => None,
        }
    }

    /// Human-readable location for logs and the UI.
    pub fn location(&self) -> String {
        match self {
            PlayableHandle::Local { path, .. } => path.display().to_string(),
            PlayableHandle::Remote { url } => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let local = PlayableHandle::Local {
            id: 1,
            path: PathBuf::from("/tmp/clip-1.wav"),
        };
        assert!(local.is_local());
        assert!(local.url().is_none());
        assert!(local.path().is_some());

        let remote = PlayableHandle::Remote {
            url: "http://svc/out/1.wav".into(),
        };
        assert!(!remote.is_local());
        assert_eq!(remote.url(), Some("http://svc/out/1.wav"));
        assert!(remote.path().is_none());
    }
}
