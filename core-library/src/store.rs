//! Persistence store interfaces
//!
//! The track collection and the resume point are stored independently: a
//! resume point may reference a track that no longer exists, and callers
//! only honour it when the track is present.

use crate::error::Result;
use crate::models::{ResumePoint, TrackRecord};
use async_trait::async_trait;

/// Durable storage for the ordered track collection.
#[async_trait]
pub trait TrackCollectionStore: Send + Sync {
    /// Replace the stored collection with `records`.
    ///
    /// Either the whole new collection is stored or the previous one is kept;
    /// a reader never observes a partial write.
    async fn save_library(&self, records: &[TrackRecord]) -> Result<()>;

    /// Load the stored collection in its saved order. Empty when nothing was
    /// stored yet.
    ///
    /// # Errors
    ///
    /// [`LibraryError::StoreUnavailable`](crate::LibraryError::StoreUnavailable)
    /// if the store cannot be opened or read.
    async fn load_library(&self) -> Result<Vec<TrackRecord>>;
}

/// Durable storage for the last playback position.
#[async_trait]
pub trait ResumePointStore: Send + Sync {
    /// Overwrite the stored resume point. Last write wins.
    async fn save_resume_point(&self, point: &ResumePoint) -> Result<()>;

    async fn load_resume_point(&self) -> Result<Option<ResumePoint>>;
}
