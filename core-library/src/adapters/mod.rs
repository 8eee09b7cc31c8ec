//! Store implementations
//!
//! Concrete [`TrackCollectionStore`](crate::store::TrackCollectionStore) and
//! [`ResumePointStore`](crate::store::ResumePointStore) backends.

pub mod sqlite_native;

pub use sqlite_native::SqliteLibraryStore;
