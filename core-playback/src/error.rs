//! # Playback Error Types

use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

/// Errors returned by playback controller operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Operation needs a current track and the library has none.
    #[error("No current track")]
    NoCurrentTrack,

    /// Seek target is not a finite number.
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// The host audio device rejected a command.
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        PlaybackError::Device(err.to_string())
    }
}

impl PlaybackError {
    /// Returns `true` if the request was invalid for the current state
    /// (no current track, unknown id, duplicate id, empty library).
    pub fn is_state_error(&self) -> bool {
        match self {
            PlaybackError::NoCurrentTrack | PlaybackError::InvalidSeekPosition(_) => true,
            PlaybackError::Library(e) => !e.is_environmental(),
            PlaybackError::Device(_) => false,
        }
    }

    /// Returns `true` if the failure came from the device or storage.
    pub fn is_environmental(&self) -> bool {
        !self.is_state_error()
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
