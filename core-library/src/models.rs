//! Domain models for the track library
//!
//! [`Track`] is immutable once ingested. Whether a track is the current one
//! is not part of the track: the [`Library`](crate::repository::Library)
//! keeps a single active id and exposes it through the read-only
//! [`TrackRecord`] projection, which is also the persisted row layout.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Prefix of ids assigned to ingested files.
pub const UPLOAD_ID_PREFIX: &str = "upload-";

/// A user-supplied audio track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Track {
    /// Unique identifier, stable for the lifetime of the library
    pub id: String,
    /// Display name derived from the file name
    pub name: String,
    pub artist: String,
    /// Artwork reference (URI)
    pub cover: String,
    /// Playable reference handed to the audio device (data URI)
    pub audio: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        cover: impl Into<String>,
        audio: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            cover: cover.into(),
            audio: audio.into(),
        }
    }

    /// Validate the track data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Track name cannot be empty".to_string());
        }
        if self.audio.is_empty() {
            return Err("Track audio reference cannot be empty".to_string());
        }
        Ok(())
    }
}

/// A track together with its derived `active` flag.
///
/// Produced by [`Library::all`](crate::repository::Library::all) for
/// rendering and persistence. Editing a record never changes the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TrackRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub track: Track,
    pub active: bool,
}

impl TrackRecord {
    pub fn new(track: Track, active: bool) -> Self {
        Self { track, active }
    }

    pub fn id(&self) -> &str {
        &self.track.id
    }
}

/// Last known playback position, persisted separately from the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub last_track_id: String,
    pub last_position_seconds: f64,
}

impl ResumePoint {
    /// Negative or non-finite positions are stored as 0.
    pub fn new(track_id: impl Into<String>, position_seconds: f64) -> Self {
        let last_position_seconds = if position_seconds.is_finite() && position_seconds > 0.0 {
            position_seconds
        } else {
            0.0
        };

        Self {
            last_track_id: track_id.into(),
            last_position_seconds,
        }
    }
}
