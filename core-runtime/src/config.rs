//! # Core Configuration Module
//!
//! Configuration for the playback core, built with [`CoreConfig::builder`].
//!
//! ## Required Dependencies
//!
//! - `AudioDevice` - the host audio element the controller drives
//!
//! ## Defaults
//!
//! - `database_path`: with the `desktop-shims` feature, `player.db` inside the
//!   platform data directory; otherwise it must be set explicitly
//! - `resume_save_interval`: 1 second
//! - `default_artist`: `"Unknown Artist"`
//! - `default_cover`: [`DEFAULT_COVER`]
//! - `select_on_ingest`: `true`
//! - `event_buffer_size`: [`DEFAULT_EVENT_BUFFER_SIZE`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/player.db")
//!     .audio_device(Arc::new(MyAudioElement::new()))
//!     .build()?;
//! ```
//!
//! A missing device fails fast:
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let result = CoreConfig::builder()
//!     .database_path("/path/to/player.db")
//!     .build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::AudioDevice;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Artist shown for tracks ingested without artist metadata.
pub const DEFAULT_ARTIST: &str = "Unknown Artist";

/// Built-in placeholder artwork reference.
pub const DEFAULT_COVER: &str = "builtin://cover/placeholder.png";

/// Default minimum spacing between resume point writes during playback.
pub const DEFAULT_RESUME_SAVE_INTERVAL: Duration = Duration::from_secs(1);

const MAX_RESUME_SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Core configuration for the playback core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database holding the library and resume point
    pub database_path: PathBuf,

    /// Minimum spacing between resume point writes triggered by progress
    pub resume_save_interval: Duration,

    /// Artist assigned to ingested tracks
    pub default_artist: String,

    /// Cover reference assigned to ingested tracks
    pub default_cover: String,

    /// Make a freshly ingested track the current track
    pub select_on_ingest: bool,

    /// Capacity of the notification broadcast channel
    pub event_buffer_size: usize,

    /// Host audio element (required)
    pub audio_device: Arc<dyn AudioDevice>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("resume_save_interval", &self.resume_save_interval)
            .field("default_artist", &self.default_artist)
            .field("default_cover", &self.default_cover)
            .field("select_on_ingest", &self.select_on_ingest)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("audio_device", &"AudioDevice { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Checks that the database path and default artist are not empty, the
    /// resume interval does not exceed 60 seconds and the event buffer can
    /// hold at least one event.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.resume_save_interval > MAX_RESUME_SAVE_INTERVAL {
            return Err(Error::InvalidValue {
                field: "resume_save_interval".to_string(),
                message: format!(
                    "must not exceed {} seconds",
                    MAX_RESUME_SAVE_INTERVAL.as_secs()
                ),
            });
        }

        if self.default_artist.trim().is_empty() {
            return Err(Error::InvalidValue {
                field: "default_artist".to_string(),
                message: "cannot be empty".to_string(),
            });
        }

        if self.event_buffer_size == 0 {
            return Err(Error::InvalidValue {
                field: "event_buffer_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn audio_device_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioDevice".to_string(),
        message: "AudioDevice implementation is required to drive playback. \
                 Web: wrap the page's <audio> element. \
                 Desktop: inject a native player or bridge_desktop::HeadlessAudioDevice."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_database_path() -> Result<PathBuf> {
    Ok(bridge_desktop::default_data_dir().join("player.db"))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_database_path() -> Result<PathBuf> {
    Err(Error::Config(
        "Database path is required. Set it explicitly or enable the 'desktop-shims' feature \
         to default to the platform data directory."
            .to_string(),
    ))
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    resume_save_interval: Option<Duration>,
    default_artist: Option<String>,
    default_cover: Option<String>,
    select_on_ingest: Option<bool>,
    event_buffer_size: Option<usize>,
    audio_device: Option<Arc<dyn AudioDevice>>,
}

impl CoreConfigBuilder {
    /// Sets the database path.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/player.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the minimum spacing between progress-driven resume writes.
    pub fn resume_save_interval(mut self, interval: Duration) -> Self {
        self.resume_save_interval = Some(interval);
        self
    }

    pub fn default_artist(mut self, artist: impl Into<String>) -> Self {
        self.default_artist = Some(artist.into());
        self
    }

    pub fn default_cover(mut self, cover: impl Into<String>) -> Self {
        self.default_cover = Some(cover.into());
        self
    }

    /// Whether an ingested track immediately becomes the current track.
    pub fn select_on_ingest(mut self, select: bool) -> Self {
        self.select_on_ingest = Some(select);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the host audio element.
    pub fn audio_device(mut self, device: Arc<dyn AudioDevice>) -> Self {
        self.audio_device = Some(device);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no audio device was provided
    /// - [`Error::Config`] when no database path is available
    /// - any validation error from [`CoreConfig::validate`]
    pub fn build(self) -> Result<CoreConfig> {
        let audio_device = self.audio_device.ok_or_else(audio_device_missing_error)?;

        let database_path = match self.database_path {
            Some(path) => path,
            None => provide_default_database_path()?,
        };

        let config = CoreConfig {
            database_path,
            resume_save_interval: self
                .resume_save_interval
                .unwrap_or(DEFAULT_RESUME_SAVE_INTERVAL),
            default_artist: self
                .default_artist
                .unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
            default_cover: self
                .default_cover
                .unwrap_or_else(|| DEFAULT_COVER.to_string()),
            select_on_ingest: self.select_on_ingest.unwrap_or(true),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            audio_device,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::mock;

    mock! {
        Device {}

        #[async_trait]
        impl AudioDevice for Device {
            async fn set_source(&self, uri: &str) -> BridgeResult<()>;
            async fn play(&self) -> BridgeResult<()>;
            async fn pause(&self) -> BridgeResult<()>;
            async fn seek(&self, position_secs: f64) -> BridgeResult<()>;
            async fn unload(&self) -> BridgeResult<()>;
        }
    }

    fn device() -> Arc<dyn AudioDevice> {
        Arc::new(MockDevice::new())
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .audio_device(device())
            .build()
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/player.db"));
        assert_eq!(config.resume_save_interval, DEFAULT_RESUME_SAVE_INTERVAL);
        assert_eq!(config.default_artist, DEFAULT_ARTIST);
        assert_eq!(config.default_cover, DEFAULT_COVER);
        assert!(config.select_on_ingest);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .resume_save_interval(Duration::from_millis(250))
            .default_artist("Various")
            .default_cover("https://example.invalid/cover.png")
            .select_on_ingest(false)
            .event_buffer_size(8)
            .audio_device(device())
            .build()
            .unwrap();

        assert_eq!(config.resume_save_interval, Duration::from_millis(250));
        assert_eq!(config.default_artist, "Various");
        assert!(!config.select_on_ingest);
        assert_eq!(config.event_buffer_size, 8);
    }

    #[test]
    fn test_missing_device_is_capability_error() {
        let err = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .build()
            .unwrap_err();

        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "AudioDevice"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let too_slow = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .resume_save_interval(Duration::from_secs(120))
            .audio_device(device())
            .build();
        assert!(matches!(too_slow, Err(Error::InvalidValue { .. })));

        let blank_artist = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .default_artist("  ")
            .audio_device(device())
            .build();
        assert!(matches!(blank_artist, Err(Error::InvalidValue { .. })));

        let empty_path = CoreConfig::builder()
            .database_path("")
            .audio_device(device())
            .build();
        assert!(matches!(empty_path, Err(Error::Config(_))));

        let no_buffer = CoreConfig::builder()
            .database_path("/tmp/player.db")
            .event_buffer_size(0)
            .audio_device(device())
            .build();
        assert!(matches!(no_buffer, Err(Error::InvalidValue { .. })));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_database_path_required_without_shims() {
        let result = CoreConfig::builder().audio_device(device()).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_database_path_defaults_with_shims() {
        let config = CoreConfig::builder().audio_device(device()).build().unwrap();
        assert!(config.database_path.ends_with("player.db"));
    }
}
