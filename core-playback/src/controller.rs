//! # Playback Controller
//!
//! State machine driving a host [`AudioDevice`] from user intents and device
//! notifications.
//!
//! ```text
//!            append / load              play
//!   Empty ───────────────────> Idle ──────────> Playing
//!     ^                         ^  <──────────     │
//!     └──── remove last ────────┘     pause        │
//!     └────────────────── remove last ─────────────┘
//! ```
//!
//! The controller owns the [`Library`], so it is the only code that moves the
//! active marker. Every library mutation queues a full snapshot on the
//! [`PersistenceQueue`]; the resume point is queued on pause, seek and track
//! change, and at most once per `resume_save_interval` from progress updates.
//!
//! Loading a source is asynchronous on the device side. Play requests and
//! seeks issued before the device reports [`DeviceEvent::ReadyToPlay`] for the
//! current source are held and applied once it does. Readiness of a replaced
//! source is ignored, and time updates before readiness never move the
//! position.

use crate::error::{PlaybackError, Result};
use crate::state::{PlaybackState, PlaybackStatus, Position};
use bridge_traits::playback::{AudioDevice, DeviceEvent};
use core_library::{Library, PersistenceQueue, ResumePoint, Track, TrackRecord};
use core_runtime::config::DEFAULT_RESUME_SAVE_INTERVAL;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, PlaybackEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Minimum spacing between resume point writes triggered by progress
    pub resume_save_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            resume_save_interval: DEFAULT_RESUME_SAVE_INTERVAL,
        }
    }
}

pub struct PlaybackController {
    library: Library,
    device: Arc<dyn AudioDevice>,
    persistence: PersistenceQueue,
    events: EventBus,
    options: ControllerOptions,

    is_playing: bool,
    position: Position,
    source_ready: bool,
    pending_play: bool,
    pending_seek: Option<f64>,
    last_resume_write: Option<Instant>,
}

impl PlaybackController {
    /// Controller with an empty library. Call
    /// [`load_library`](Self::load_library) to restore a session.
    pub fn new(
        device: Arc<dyn AudioDevice>,
        persistence: PersistenceQueue,
        events: EventBus,
        options: ControllerOptions,
    ) -> Self {
        Self {
            library: Library::new(),
            device,
            persistence,
            events,
            options,
            is_playing: false,
            position: Position::default(),
            source_ready: false,
            pending_play: false,
            pending_seek: None,
            last_resume_write: None,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn state(&self) -> PlaybackState {
        let status = if self.library.is_empty() {
            PlaybackStatus::Empty
        } else if self.is_playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Idle
        };

        PlaybackState {
            status,
            current_track_id: self.library.active_id().map(str::to_string),
            is_playing: self.is_playing,
            position: self.position,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.library.active()
    }

    /// Ordered library snapshot with the active flag, for rendering.
    pub fn records(&self) -> Vec<TrackRecord> {
        self.library.all()
    }

    // ------------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------------

    /// Restore a persisted session.
    ///
    /// The resume point's track becomes current at the saved position when it
    /// is still in the library; otherwise the first track becomes current at
    /// 0. Playback never starts on its own. The normalized collection is saved
    /// back unless it is empty. A device that refuses the source
    /// is reported as a [`PlaybackEvent::Error`] and does not fail the load.
    pub async fn load_library(
        &mut self,
        records: Vec<TrackRecord>,
        resume: Option<ResumePoint>,
    ) -> Result<()> {
        self.library = Library::from_records(records);
        self.is_playing = false;
        self.pending_play = false;
        self.pending_seek = None;
        self.position = Position::default();

        let resumed = resume.filter(|point| self.library.contains(&point.last_track_id));
        let (current_id, start_at) = match (&resumed, self.library.first()) {
            (Some(point), _) => (Some(point.last_track_id.clone()), point.last_position_seconds),
            (None, Some(first)) => (Some(first.id.clone()), 0.0),
            (None, None) => (None, 0.0),
        };

        match &current_id {
            Some(id) => {
                self.library.set_active(id)?;
                self.position = Position::at(start_at);
                if start_at > 0.0 {
                    self.pending_seek = Some(start_at);
                }
                if let Err(e) = self.load_current_source().await {
                    self.report_device_error(e.to_string());
                }
            }
            None => self.library.clear_active(),
        }

        info!(
            tracks = self.library.len(),
            current = ?current_id,
            resumed = resumed.is_some(),
            "Library loaded"
        );

        // An empty load may mean the store was unreadable; never overwrite it.
        if !self.library.is_empty() {
            self.persist_library();
        }
        self.emit(CoreEvent::Library(LibraryEvent::Loaded {
            track_count: self.library.len(),
            current_track_id: current_id,
        }));
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Library mutation
    // ------------------------------------------------------------------------

    /// Append a track. The first track of an empty library becomes current.
    pub async fn append_track(&mut self, track: Track) -> Result<()> {
        let track_id = track.id.clone();
        let name = track.name.clone();
        self.library.append(track)?;

        self.persist_library();
        self.emit(CoreEvent::Library(LibraryEvent::TrackAdded {
            track_id: track_id.clone(),
            name,
        }));

        if self.library.active_id().is_none() {
            self.change_track(&track_id).await?;
        }
        Ok(())
    }

    /// Remove a track and return it.
    ///
    /// Removing the current track makes the track that followed it current
    /// (wrapping to the first), keeping the play intent. Removing the last
    /// track unloads the device and leaves the controller `Empty`.
    pub async fn remove_track(&mut self, id: &str) -> Result<Track> {
        let was_current = self.library.active_id() == Some(id);
        let successor = if was_current && self.library.len() > 1 {
            Some(self.library.next(id)?.id.clone())
        } else {
            None
        };

        let removed = self.library.remove(id)?;
        self.persist_library();
        self.emit(CoreEvent::Library(LibraryEvent::TrackRemoved {
            track_id: removed.id.clone(),
        }));

        if was_current {
            match successor {
                Some(next_id) => {
                    // The removal is already committed; a rejected source
                    // is reported like any other device failure.
                    if let Err(e) = self.change_track(&next_id).await {
                        self.report_device_error(e.to_string());
                    }
                }
                None => self.become_empty().await?,
            }
        }

        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------------

    /// Make `id` the current track, starting from 0.
    ///
    /// If playback was requested it continues on the new track once the device
    /// has loaded it.
    pub async fn select(&mut self, id: &str) -> Result<()> {
        if self.library.is_empty() {
            return Err(core_library::LibraryError::EmptyLibrary.into());
        }
        if !self.library.contains(id) {
            return Err(core_library::LibraryError::track_not_found(id).into());
        }

        self.change_track(id).await
    }

    pub async fn play(&mut self) -> Result<()> {
        let track_id = self.require_current()?;
        if self.is_playing {
            return Ok(());
        }

        self.is_playing = true;
        if self.source_ready {
            self.start_device().await?;
        } else {
            debug!(track_id = %track_id, "Play deferred until source is ready");
            self.pending_play = true;
        }

        self.emit(CoreEvent::Playback(PlaybackEvent::Started { track_id }));
        Ok(())
    }

    pub async fn pause(&mut self) -> Result<()> {
        let track_id = self.require_current()?;
        if !self.is_playing {
            return Ok(());
        }

        self.is_playing = false;
        self.pending_play = false;
        if self.source_ready {
            self.device.pause().await?;
        }

        self.write_resume_point();
        self.emit(CoreEvent::Playback(PlaybackEvent::Paused {
            track_id,
            position_ms: self.position.position_ms(),
        }));
        Ok(())
    }

    pub async fn toggle_play(&mut self) -> Result<()> {
        if self.is_playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Jump to `seconds`, clamped to the track bounds.
    pub async fn seek(&mut self, seconds: f64) -> Result<()> {
        self.require_current()?;
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidSeekPosition(seconds));
        }

        let mut target = seconds.max(0.0);
        if let Some(duration) = self.position.duration {
            target = target.min(duration);
        }

        if self.source_ready {
            self.device.seek(target).await?;
        } else {
            self.pending_seek = Some(target);
        }

        self.position = Position::new(target, self.position.duration);
        self.write_resume_point();
        self.emit_position();
        Ok(())
    }

    pub async fn skip_forward(&mut self) -> Result<()> {
        let current = self.require_current()?;
        let next = self.library.next(&current)?.id.clone();
        self.change_track(&next).await
    }

    pub async fn skip_back(&mut self) -> Result<()> {
        let current = self.require_current()?;
        let previous = self.library.previous(&current)?.id.clone();
        self.change_track(&previous).await
    }

    // ------------------------------------------------------------------------
    // Device notifications
    // ------------------------------------------------------------------------

    pub async fn handle_device_event(&mut self, event: DeviceEvent) -> Result<()> {
        match event {
            DeviceEvent::Progress {
                current_time,
                duration,
            } => {
                self.on_progress(current_time, duration);
                Ok(())
            }
            DeviceEvent::Ended => self.on_track_ended().await,
            DeviceEvent::ReadyToPlay { uri } => self.on_ready_to_play(&uri).await,
            DeviceEvent::Error { message } => {
                self.on_device_error(message);
                Ok(())
            }
        }
    }

    /// Record a time update from the device.
    ///
    /// Until the current source reports ready, updates only refresh the
    /// duration: the element is still at 0 or reporting the replaced source,
    /// and the known position (a resume point, say) must survive.
    pub fn on_progress(&mut self, current_time: f64, duration: Option<f64>) {
        if self.library.active_id().is_none() {
            return;
        }

        if !self.source_ready {
            self.position = Position::new(self.position.current_time, duration);
            self.emit_position();
            return;
        }

        self.position = Position::new(current_time, duration);

        let due = self
            .last_resume_write
            .map_or(true, |last| last.elapsed() >= self.options.resume_save_interval);
        if due {
            self.write_resume_point();
        }

        self.emit_position();
    }

    /// Advance to the next track (wrapping) when the current one finishes.
    pub async fn on_track_ended(&mut self) -> Result<()> {
        let Some(current) = self.library.active_id().map(str::to_string) else {
            return Ok(());
        };

        let next = self.library.next(&current)?.id.clone();
        debug!(from = %current, to = %next, "Track ended");
        self.change_track(&next).await
    }

    /// Apply what was waiting for the source `uri`: a pending seek, then a
    /// pending play.
    ///
    /// Readiness reported for any other source is stale and ignored.
    pub async fn on_ready_to_play(&mut self, uri: &str) -> Result<()> {
        let current_audio = self.library.active().map(|track| track.audio.as_str());
        if current_audio != Some(uri) {
            debug!(uri_len = uri.len(), "Ignoring readiness of a replaced source");
            return Ok(());
        }
        self.source_ready = true;

        if let Some(target) = self.pending_seek.take() {
            let reached = match self.device.seek(target).await {
                Ok(()) => target,
                Err(e) => {
                    warn!(error = %e, target, "Deferred seek failed");
                    0.0
                }
            };
            self.position = Position::new(reached, self.position.duration);
            self.emit_position();
        }

        if self.pending_play && self.is_playing {
            self.pending_play = false;
            self.start_device().await?;
        }
        Ok(())
    }

    fn on_device_error(&mut self, message: String) {
        self.is_playing = false;
        self.pending_play = false;
        self.report_device_error(message);
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Write the final resume point and drain the persistence queue.
    pub async fn shutdown(&mut self) {
        self.write_resume_point();
        self.persistence.close().await;
        info!("Playback controller shut down");
    }

    /// Wait until all queued writes reached the store.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require_current(&self) -> Result<String> {
        self.library
            .active_id()
            .map(str::to_string)
            .ok_or(PlaybackError::NoCurrentTrack)
    }

    /// Make `id` current from 0, keeping the play intent.
    ///
    /// The change is persisted and published even when the device rejects the
    /// new source; that failure is returned afterwards.
    async fn change_track(&mut self, id: &str) -> Result<()> {
        self.library.set_active(id)?;
        self.position = Position::default();
        self.pending_seek = None;
        self.pending_play = self.is_playing;

        let loaded = self.load_current_source().await;

        self.persist_library();
        self.write_resume_point();

        let name = self.library.active().map(|track| track.name.clone());
        debug!(track_id = %id, playing = self.is_playing, "Current track changed");
        self.emit(CoreEvent::Playback(PlaybackEvent::TrackChanged {
            track_id: Some(id.to_string()),
            name,
        }));
        loaded
    }

    async fn load_current_source(&mut self) -> Result<()> {
        let Some(audio) = self.library.active().map(|track| track.audio.clone()) else {
            return Err(PlaybackError::NoCurrentTrack);
        };

        self.source_ready = false;
        if let Err(e) = self.device.set_source(&audio).await {
            self.is_playing = false;
            self.pending_play = false;
            return Err(e.into());
        }
        Ok(())
    }

    async fn become_empty(&mut self) -> Result<()> {
        self.library.clear_active();
        self.is_playing = false;
        self.pending_play = false;
        self.pending_seek = None;
        self.source_ready = false;
        self.position = Position::default();

        self.emit(CoreEvent::Playback(PlaybackEvent::TrackChanged {
            track_id: None,
            name: None,
        }));
        self.device.unload().await?;
        Ok(())
    }

    async fn start_device(&mut self) -> Result<()> {
        if let Err(e) = self.device.play().await {
            self.is_playing = false;
            self.pending_play = false;
            return Err(e.into());
        }
        Ok(())
    }

    fn persist_library(&self) {
        self.persistence.save_library(self.library.all());
    }

    fn write_resume_point(&mut self) {
        let Some(id) = self.library.active_id() else {
            return;
        };
        self.persistence
            .save_resume_point(ResumePoint::new(id, self.position.current_time));
        self.last_resume_write = Some(Instant::now());
    }

    fn report_device_error(&self, message: String) {
        warn!(error = %message, "Audio device error");
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            track_id: self.library.active_id().map(str::to_string),
            message,
        }));
    }

    fn emit_position(&self) {
        let Some(track_id) = self.library.active_id() else {
            return;
        };
        self.emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
            track_id: track_id.to_string(),
            position_ms: self.position.position_ms(),
            duration_ms: self.position.duration_ms(),
            percent: self.position.progress_percent,
        }));
    }

    fn emit(&self, event: CoreEvent) {
        self.events.emit(event).ok();
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state())
            .field("source_ready", &self.source_ready)
            .field("pending_play", &self.pending_play)
            .field("pending_seek", &self.pending_seek)
            .finish()
    }
}
