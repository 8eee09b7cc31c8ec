//! Local file access using Tokio

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::FileBlob};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const APP_DIR_NAME: &str = "player-core";

/// Platform data directory for the player.
///
/// Falls back to `~/.local/share` when the platform reports no data
/// directory, and to the working directory when there is no home either.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join(APP_DIR_NAME)
}

/// A file on the local disk offered for ingestion.
///
/// The file is only opened when [`FileBlob::read_all`] is called, so a file
/// deleted between picking and reading surfaces as an I/O error then.
#[derive(Debug, Clone)]
pub struct LocalFileBlob {
    path: PathBuf,
    name: String,
    mime_type: Option<String>,
}

impl LocalFileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            name,
            mime_type: None,
        }
    }

    /// Attach a MIME type reported by the host's file picker.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileBlob for LocalFileBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn read_all(&self) -> Result<Bytes> {
        let data = fs::read(&self.path).await?;
        debug!(file = %self.name, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }
}
