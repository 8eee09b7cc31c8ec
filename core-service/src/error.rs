use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl CoreError {
    /// Returns `true` for requests that were invalid in the current state,
    /// as opposed to failures of the store, the device or the host.
    pub fn is_state_error(&self) -> bool {
        match self {
            CoreError::Playback(e) => e.is_state_error(),
            CoreError::Library(e) => !e.is_environmental(),
            CoreError::InitializationFailed(_) | CoreError::Config(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
