//! Headless audio device
//!
//! Stands in for a real audio element on hosts without audio output (CLI
//! demos, servers, tests of the wiring). Commands update an internal state
//! and are logged; loading a source reports [`DeviceEvent::ReadyToPlay`]
//! for that source immediately on the event channel.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    playback::{AudioDevice, DeviceEvent},
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq)]
struct DeviceState {
    source: Option<String>,
    playing: bool,
    position_secs: f64,
}

/// [`AudioDevice`] without audio output.
#[derive(Debug, Default)]
pub struct HeadlessAudioDevice {
    state: Mutex<DeviceState>,
    events: Option<mpsc::Sender<DeviceEvent>>,
}

impl HeadlessAudioDevice {
    /// A device that reports no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// A device paired with the receiving end of its event channel.
    ///
    /// Events are sent with `try_send`; when the buffer is full the event is
    /// dropped with a warning rather than blocking the caller.
    pub fn with_events(buffer: usize) -> (Self, mpsc::Receiver<DeviceEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let device = Self {
            state: Mutex::new(DeviceState::default()),
            events: Some(tx),
        };
        (device, rx)
    }

    pub async fn source(&self) -> Option<String> {
        self.state.lock().await.source.clone()
    }

    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.playing
    }

    pub async fn position_secs(&self) -> f64 {
        self.state.lock().await.position_secs
    }

    fn notify(&self, event: DeviceEvent) {
        let Some(events) = &self.events else {
            return;
        };

        if let Err(err) = events.try_send(event) {
            warn!(error = %err, "Dropped headless device event");
        }
    }
}

#[async_trait]
impl AudioDevice for HeadlessAudioDevice {
    async fn set_source(&self, uri: &str) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.source = Some(uri.to_string());
            state.playing = false;
            state.position_secs = 0.0;
        }

        // Data URIs carry the whole file; log the scheme and size only
        debug!(
            scheme = uri.split(':').next().unwrap_or_default(),
            len = uri.len(),
            "Source set"
        );
        self.notify(DeviceEvent::ready_to_play(uri));
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.source.is_none() {
            return Err(BridgeError::Device("no source loaded".to_string()));
        }
        state.playing = true;
        debug!(position_secs = state.position_secs, "Play");
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.playing = false;
        debug!(position_secs = state.position_secs, "Pause");
        Ok(())
    }

    async fn seek(&self, position_secs: f64) -> Result<()> {
        if !position_secs.is_finite() || position_secs < 0.0 {
            return Err(BridgeError::Device(format!(
                "invalid seek position {position_secs}"
            )));
        }
        self.state.lock().await.position_secs = position_secs;
        debug!(position_secs, "Seek");
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        *self.state.lock().await = DeviceState::default();
        debug!("Source unloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_source_reports_ready() {
        let (device, mut events) = HeadlessAudioDevice::with_events(4);

        device.set_source("data:audio/mpeg;base64,AAAA").await.unwrap();

        assert_eq!(
            events.recv().await,
            Some(DeviceEvent::ready_to_play("data:audio/mpeg;base64,AAAA"))
        );
        assert_eq!(
            device.source().await.as_deref(),
            Some("data:audio/mpeg;base64,AAAA")
        );
        assert!(!device.is_playing().await);
    }

    #[tokio::test]
    async fn test_play_requires_source() {
        let device = HeadlessAudioDevice::new();
        assert!(matches!(device.play().await, Err(BridgeError::Device(_))));

        device.set_source("data:audio/ogg;base64,AA==").await.unwrap();
        device.play().await.unwrap();
        assert!(device.is_playing().await);

        device.pause().await.unwrap();
        assert!(!device.is_playing().await);
    }

    #[tokio::test]
    async fn test_seek_and_unload() {
        let device = HeadlessAudioDevice::new();
        device.set_source("data:audio/wav;base64,AA==").await.unwrap();

        device.seek(42.5).await.unwrap();
        assert_eq!(device.position_secs().await, 42.5);
        assert!(device.seek(-1.0).await.is_err());
        assert!(device.seek(f64::NAN).await.is_err());

        device.unload().await.unwrap();
        assert!(device.source().await.is_none());
        assert_eq!(device.position_secs().await, 0.0);
    }

    #[tokio::test]
    async fn test_full_event_buffer_does_not_block() {
        let (device, mut events) = HeadlessAudioDevice::with_events(1);

        device.set_source("data:a").await.unwrap();
        device.set_source("data:b").await.unwrap();

        assert_eq!(events.recv().await, Some(DeviceEvent::ready_to_play("data:a")));
        assert!(events.try_recv().is_err());
        assert_eq!(device.source().await.as_deref(), Some("data:b"));
    }
}
