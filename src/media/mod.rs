//! Transient playable-audio resources.
//!
//! [`MediaStore`] creates and releases locally-held clips, [`PlayableHandle`]
//! is the opaque reference handed around the session, and [`Player`] is the
//! playback seam (production: [`RodioPlayer`]).

pub mod handle;
pub mod playback;
pub mod store;

pub use handle::PlayableHandle;
pub use playback::{PlaybackError, Player, RodioPlayer};
pub use store::{MediaError, MediaStore};
