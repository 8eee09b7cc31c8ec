//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host audio device and the library store into the
//! playback controller and exposes the operations a UI calls. Desktop hosts
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to default the database location and ingest files
//! straight from disk.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::bootstrap;
//!
//! let config = CoreConfig::builder()
//!     .audio_device(device)
//!     .build()?;
//! let player = bootstrap(config).await?;
//! let _pump = player.attach_device_events(device_events);
//!
//! player.ingest_file(&blob).await?;
//! player.play().await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::playback::DeviceEvent;
use bridge_traits::storage::FileBlob;
use core_library::{
    IngestOptions, Ingestor, LibraryError, PersistenceQueue, ResumePoint, ResumePointStore,
    SqliteLibraryStore, Track, TrackCollectionStore, TrackRecord,
};
use core_playback::{ControllerOptions, PlaybackController, PlaybackState};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(feature = "desktop-shims")]
use bridge_desktop::LocalFileBlob;

/// Aggregated handle to the stores the core persists into.
pub struct PlayerDependencies {
    pub library_store: Arc<dyn TrackCollectionStore>,
    pub resume_store: Arc<dyn ResumePointStore>,
}

impl PlayerDependencies {
    /// Construct a dependency bundle from explicit store handles.
    pub fn new(
        library_store: Arc<dyn TrackCollectionStore>,
        resume_store: Arc<dyn ResumePointStore>,
    ) -> Self {
        Self {
            library_store,
            resume_store,
        }
    }

    /// Both stores backed by one SQLite database.
    pub fn sqlite(store: Arc<SqliteLibraryStore>) -> Self {
        Self::new(store.clone(), store)
    }
}

struct Inner {
    controller: Mutex<PlaybackController>,
    ingestor: Ingestor,
    events: EventBus,
    select_on_ingest: bool,
}

/// Primary façade exposed to host applications.
///
/// Cheap to clone. All clones drive the same controller, and every
/// operation runs to completion before the next one starts.
#[derive(Clone)]
pub struct PlayerService {
    inner: Arc<Inner>,
}

impl PlayerService {
    /// Load the persisted session and start the persistence writer.
    ///
    /// An unreadable store does not fail startup: the session starts with an
    /// empty library and a [`LibraryEvent::StoreUnavailable`] is published.
    pub async fn start(config: CoreConfig, deps: PlayerDependencies) -> Result<Self> {
        let events = EventBus::new(config.event_buffer_size);
        Self::start_with_events(config, deps, events).await
    }

    /// Like [`start`](Self::start), publishing on an existing bus so that
    /// subscribers also see notices raised while the session loads.
    pub async fn start_with_events(
        config: CoreConfig,
        deps: PlayerDependencies,
        events: EventBus,
    ) -> Result<Self> {
        let (records, resume) = load_session(&deps, &events).await;

        let persistence =
            PersistenceQueue::spawn(deps.library_store, deps.resume_store, events.clone());
        let mut controller = PlaybackController::new(
            config.audio_device.clone(),
            persistence,
            events.clone(),
            ControllerOptions {
                resume_save_interval: config.resume_save_interval,
            },
        );
        controller.load_library(records, resume).await?;

        let ingestor = Ingestor::new(IngestOptions {
            default_artist: config.default_artist.clone(),
            default_cover: config.default_cover.clone(),
        });

        info!(
            select_on_ingest = config.select_on_ingest,
            "Player service started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                controller: Mutex::new(controller),
                ingestor,
                events,
                select_on_ingest: config.select_on_ingest,
            }),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.controller.lock().await.state()
    }

    /// Ordered library with the active flag, for rendering.
    pub async fn tracks(&self) -> Vec<TrackRecord> {
        self.inner.controller.lock().await.records()
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.inner.controller.lock().await.current_track().cloned()
    }

    /// Read a host file, add it to the library and persist the library.
    ///
    /// Returns `Ok(None)` when the file cannot be read; the failure is
    /// published as [`LibraryEvent::IngestFailed`] instead.
    pub async fn ingest_file(&self, blob: &dyn FileBlob) -> Result<Option<Track>> {
        let track = match self.inner.ingestor.ingest(blob).await {
            Ok(track) => track,
            Err(LibraryError::UnreadableFile { name, message }) => {
                warn!(file = %name, error = %message, "Skipping unreadable file");
                self.inner
                    .events
                    .emit(CoreEvent::Library(LibraryEvent::IngestFailed {
                        file_name: name,
                        message,
                    }))
                    .ok();
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut controller = self.inner.controller.lock().await;
        controller.append_track(track.clone()).await?;
        let already_current = controller.library().active_id() == Some(track.id.as_str());
        if self.inner.select_on_ingest && !already_current {
            controller.select(&track.id).await?;
        }

        info!(track_id = %track.id, name = %track.name, "Track ingested");
        Ok(Some(track))
    }

    /// Ingest several files in order, skipping unreadable ones.
    pub async fn ingest_files(&self, blobs: &[&dyn FileBlob]) -> Result<Vec<Track>> {
        let mut ingested = Vec::with_capacity(blobs.len());
        for blob in blobs {
            if let Some(track) = self.ingest_file(*blob).await? {
                ingested.push(track);
            }
        }
        Ok(ingested)
    }

    /// Ingest a file from the local filesystem.
    #[cfg(feature = "desktop-shims")]
    pub async fn ingest_path(
        &self,
        path: impl Into<std::path::PathBuf>,
    ) -> Result<Option<Track>> {
        let blob = LocalFileBlob::new(path);
        self.ingest_file(&blob).await
    }

    pub async fn remove_track(&self, id: &str) -> Result<Track> {
        Ok(self.inner.controller.lock().await.remove_track(id).await?)
    }

    pub async fn select(&self, id: &str) -> Result<()> {
        Ok(self.inner.controller.lock().await.select(id).await?)
    }

    pub async fn play(&self) -> Result<()> {
        Ok(self.inner.controller.lock().await.play().await?)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.inner.controller.lock().await.pause().await?)
    }

    pub async fn toggle_play(&self) -> Result<()> {
        Ok(self.inner.controller.lock().await.toggle_play().await?)
    }

    pub async fn seek(&self, seconds: f64) -> Result<()> {
        Ok(self.inner.controller.lock().await.seek(seconds).await?)
    }

    pub async fn skip_forward(&self) -> Result<()> {
        Ok(self.inner.controller.lock().await.skip_forward().await?)
    }

    pub async fn skip_back(&self) -> Result<()> {
        Ok(self.inner.controller.lock().await.skip_back().await?)
    }

    /// Feed one device notification to the controller.
    pub async fn handle_device_event(&self, event: DeviceEvent) -> Result<()> {
        Ok(self
            .inner
            .controller
            .lock()
            .await
            .handle_device_event(event)
            .await?)
    }

    /// Spawn a task that forwards device notifications to the controller
    /// until the sender side is dropped.
    ///
    /// Failures while handling an event are logged and published as
    /// [`PlaybackEvent::Error`]; the pump keeps running.
    pub fn attach_device_events(
        &self,
        mut receiver: mpsc::Receiver<DeviceEvent>,
    ) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            debug!("Device event pump started");
            while let Some(event) = receiver.recv().await {
                if let Err(e) = service.handle_device_event(event).await {
                    warn!(error = %e, "Failed to handle device event");
                    let track_id = service.state().await.current_track_id;
                    service
                        .inner
                        .events
                        .emit(CoreEvent::Playback(PlaybackEvent::Error {
                            track_id,
                            message: e.to_string(),
                        }))
                        .ok();
                }
            }
            debug!("Device event pump stopped");
        })
    }

    /// Wait until every queued write reached the store.
    pub async fn flush(&self) {
        self.inner.controller.lock().await.flush().await;
    }

    /// Persist the final resume point and stop the persistence writer.
    pub async fn shutdown(&self) {
        self.inner.controller.lock().await.shutdown().await;
        info!("Player service shut down");
    }
}

async fn load_session(
    deps: &PlayerDependencies,
    events: &EventBus,
) -> (Vec<TrackRecord>, Option<ResumePoint>) {
    let records = match deps.library_store.load_library().await {
        Ok(records) => records,
        Err(e) => {
            report_store_unavailable(events, &e);
            return (Vec::new(), None);
        }
    };

    let resume = match deps.resume_store.load_resume_point().await {
        Ok(resume) => resume,
        Err(e) => {
            report_store_unavailable(events, &e);
            None
        }
    };

    debug!(
        tracks = records.len(),
        has_resume_point = resume.is_some(),
        "Session loaded from store"
    );
    (records, resume)
}

fn report_store_unavailable(events: &EventBus, error: &LibraryError) {
    warn!(error = %error, "Library store unavailable, continuing without it");
    events
        .emit(CoreEvent::Library(LibraryEvent::StoreUnavailable {
            message: error.to_string(),
        }))
        .ok();
}

/// Open the SQLite store at `config.database_path` and start the service.
pub async fn bootstrap(config: CoreConfig) -> Result<PlayerService> {
    let store = Arc::new(SqliteLibraryStore::open(&config.database_path));
    PlayerService::start(config, PlayerDependencies::sqlite(store)).await
}
