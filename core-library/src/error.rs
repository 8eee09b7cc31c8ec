use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Track {0} is already in the library")]
    DuplicateId(String),

    #[error("Library is empty")]
    EmptyLibrary,

    #[error("Library store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unreadable file {name}: {message}")]
    UnreadableFile { name: String, message: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub fn track_not_found(id: impl Into<String>) -> Self {
        LibraryError::NotFound {
            entity_type: "Track".to_string(),
            id: id.into(),
        }
    }

    /// Failures caused by the environment (storage, files, host bridges)
    /// rather than by an invalid request against the current state.
    ///
    /// Environmental errors are reported to the user as notifications and
    /// never abort the session.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            LibraryError::Database(_)
                | LibraryError::Bridge(_)
                | LibraryError::StoreUnavailable(_)
                | LibraryError::UnreadableFile { .. }
                | LibraryError::Migration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
