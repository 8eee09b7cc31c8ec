//! File blob abstraction
//!
//! A [`FileBlob`] is a file handed to the core by the host: a browser
//! `File` from an upload widget, a path picked in a desktop dialog, or bytes
//! already in memory. The core only needs its name, an optional MIME type and
//! the ability to read the whole payload asynchronously.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BridgeError, Result};

/// File supplied by the host for ingestion.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileBlob;
///
/// async fn size_of(blob: &dyn FileBlob) -> Result<usize> {
///     Ok(blob.read_all().await?.len())
/// }
/// ```
#[async_trait]
pub trait FileBlob: Send + Sync {
    /// Original file name including its extension (e.g. `song.mp3`).
    fn name(&self) -> &str;

    /// MIME type reported by the host, if any.
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// Read the entire payload into memory.
    async fn read_all(&self) -> Result<Bytes>;
}

/// In-memory blob, for hosts that already hold the bytes.
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    name: String,
    mime_type: Option<String>,
    data: Option<Bytes>,
}

impl MemoryBlob {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: Some(data.into()),
        }
    }

    /// A blob whose read always fails, mirroring a revoked or vanished file.
    pub fn unreadable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
impl FileBlob for MemoryBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read_all(&self) -> Result<Bytes> {
        self.data
            .clone()
            .ok_or_else(|| BridgeError::OperationFailed(format!("{} is not readable", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_blob_reads_payload() {
        let blob = MemoryBlob::new("song.mp3", vec![1u8, 2, 3]).with_mime_type("audio/mpeg");

        assert_eq!(blob.name(), "song.mp3");
        assert_eq!(blob.mime_type(), Some("audio/mpeg"));
        assert_eq!(blob.read_all().await.unwrap().as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn unreadable_blob_fails() {
        let blob = MemoryBlob::unreadable("gone.mp3");
        assert!(blob.mime_type().is_none());
        assert!(blob.read_all().await.is_err());
    }
}
