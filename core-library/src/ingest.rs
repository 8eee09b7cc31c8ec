//! # File Ingestion
//!
//! Turns a host-supplied [`FileBlob`] into a [`Track`]:
//!
//! 1. read the whole payload
//! 2. derive the display name from the file name, dropping a known audio
//!    extension
//! 3. assign a fresh `upload-<uuid>` id and the default artist and cover
//! 4. embed the payload as a base64 `data:` URI playable by the device
//!
//! Embedded data URIs own their bytes, so there is nothing to release when a
//! track is removed.

use crate::error::{LibraryError, Result};
use crate::models::{Track, UPLOAD_ID_PREFIX};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::storage::FileBlob;
use core_runtime::config::{DEFAULT_ARTIST, DEFAULT_COVER};
use core_runtime::logging::strip_path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fallback when neither the host nor the extension identify the format.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Audio extensions stripped from display names, with their MIME types.
const AUDIO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("flac", "audio/flac"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("webm", "audio/webm"),
];

/// Values assigned to fields a file cannot provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    pub default_artist: String,
    pub default_cover: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            default_artist: DEFAULT_ARTIST.to_string(),
            default_cover: DEFAULT_COVER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Read `blob` and build a new track from it.
    ///
    /// # Errors
    ///
    /// [`LibraryError::UnreadableFile`] if the blob has no name or its
    /// payload cannot be read.
    pub async fn ingest(&self, blob: &dyn FileBlob) -> Result<Track> {
        let raw_name = blob.name().trim();
        let file_name = strip_path(raw_name).trim();
        if file_name.is_empty() {
            return Err(LibraryError::UnreadableFile {
                name: raw_name.to_string(),
                message: "file has no name".to_string(),
            });
        }

        let data = blob.read_all().await.map_err(|e| {
            warn!(file = %file_name, error = %e, "Failed to read file");
            LibraryError::UnreadableFile {
                name: file_name.to_string(),
                message: e.to_string(),
            }
        })?;

        let mime_type = blob
            .mime_type()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .unwrap_or_else(|| guess_mime_type(file_name));

        let track = Track::new(
            format!("{UPLOAD_ID_PREFIX}{}", Uuid::new_v4()),
            display_name(file_name),
            self.options.default_artist.clone(),
            self.options.default_cover.clone(),
            data_uri(mime_type, &data),
        );

        debug!(
            track_id = %track.id,
            file = %file_name,
            size = data.len(),
            mime_type,
            "Ingested file"
        );
        Ok(track)
    }
}

fn known_extension(file_name: &str) -> Option<(&str, &'static str)> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    AUDIO_EXTENSIONS
        .iter()
        .find(|(known, _)| extension.eq_ignore_ascii_case(known))
        .map(|(_, mime)| (stem, *mime))
}

/// Display name for a file: the name without a known audio extension.
///
/// Unknown extensions are kept. A name that would become empty (`.mp3`) is
/// kept whole.
pub fn display_name(file_name: &str) -> String {
    match known_extension(file_name) {
        Some((stem, _)) if !stem.trim().is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

/// MIME type implied by a known audio extension, or [`FALLBACK_MIME_TYPE`].
pub fn guess_mime_type(file_name: &str) -> &'static str {
    known_extension(file_name)
        .map(|(_, mime)| mime)
        .unwrap_or(FALLBACK_MIME_TYPE)
}

fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}
