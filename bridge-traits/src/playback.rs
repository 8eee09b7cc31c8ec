//! Audio device bridge.
//!
//! The core never decodes audio. It drives a host-owned playback element
//! (an HTML `<audio>` tag, a native media player, a headless stub) through
//! [`AudioDevice`] and consumes the notifications the element raises as
//! [`DeviceEvent`]s. Hosts forward those events to the playback controller on
//! the same logical thread that issues commands.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Notification raised by the host audio element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Periodic time update. `duration` is `None` while metadata is unknown.
    Progress {
        current_time: f64,
        duration: Option<f64>,
    },
    /// The current source played to its end.
    Ended,
    /// A source is buffered enough to play through. `uri` is the reference
    /// passed to [`AudioDevice::set_source`], so a late notification for a
    /// replaced source can be told apart from the current one.
    ReadyToPlay { uri: String },
    /// The element failed to load or play the current source.
    Error { message: String },
}

impl DeviceEvent {
    pub fn ready_to_play(uri: impl Into<String>) -> Self {
        DeviceEvent::ReadyToPlay { uri: uri.into() }
    }

    /// Convenience constructor for progress updates with a known duration.
    pub fn progress(current_time: f64, duration: f64) -> Self {
        DeviceEvent::Progress {
            current_time,
            duration: Some(duration),
        }
    }
}

/// Host audio element driven by the playback controller.
///
/// Commands complete once the element accepted them, not once audio is
/// audible. After [`set_source`](AudioDevice::set_source) the element loads
/// asynchronously and reports [`DeviceEvent::ReadyToPlay`]; callers must not
/// assume `play` succeeds before that.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Point the element at a new audio reference (data URI or object URL).
    async fn set_source(&self, uri: &str) -> Result<()>;

    /// Begin or resume playback of the current source.
    async fn play(&self) -> Result<()>;

    /// Pause without releasing the source.
    async fn pause(&self) -> Result<()>;

    /// Jump to an absolute position in seconds.
    async fn seek(&self, position_secs: f64) -> Result<()>;

    /// Release the current source and any resources held for it.
    async fn unload(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_constructor_sets_duration() {
        let event = DeviceEvent::progress(12.5, 200.0);
        assert_eq!(
            event,
            DeviceEvent::Progress {
                current_time: 12.5,
                duration: Some(200.0)
            }
        );
    }

    #[test]
    fn device_event_serializes_with_tag() {
        let json = serde_json::to_string(&DeviceEvent::Ended).unwrap();
        assert_eq!(json, r#"{"event":"ended"}"#);

        let json = serde_json::to_string(&DeviceEvent::progress(1.0, 2.0)).unwrap();
        assert!(json.contains(r#""event":"progress""#));

        let json = serde_json::to_string(&DeviceEvent::ready_to_play("data:,a")).unwrap();
        assert_eq!(json, r#"{"event":"ready_to_play","uri":"data:,a"}"#);
    }
}
