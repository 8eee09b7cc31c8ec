//! Playback state snapshot types

use serde::{Deserialize, Serialize};

/// Coarse controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// The library has no tracks.
    Empty,
    /// A track is current but not playing.
    Idle,
    /// A track is current and playback is requested.
    Playing,
}

/// Position within the current track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Seconds from the start, never negative
    pub current_time: f64,
    /// Track length in seconds, unknown until the device loads metadata
    pub duration: Option<f64>,
    /// Whole-number progress, 0 to 100
    pub progress_percent: u8,
}

impl Position {
    pub fn at(current_time: f64) -> Self {
        Self::new(current_time, None)
    }

    pub fn new(current_time: f64, duration: Option<f64>) -> Self {
        let current_time = if current_time.is_finite() {
            current_time.max(0.0)
        } else {
            0.0
        };
        let duration = duration.filter(|d| d.is_finite() && *d >= 0.0);

        Self {
            current_time,
            duration,
            progress_percent: progress_percent(current_time, duration),
        }
    }

    pub fn position_ms(&self) -> u64 {
        seconds_to_ms(self.current_time)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration.map(seconds_to_ms)
    }
}

/// Snapshot of the controller for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// `None` exactly when the library is empty
    pub current_track_id: Option<String>,
    pub is_playing: bool,
    pub position: Position,
}

/// Progress through a track as a whole percentage.
///
/// Both values are rounded to whole seconds first, so the bar moves in
/// one-second steps. An unknown, non-finite or zero duration yields 0.
///
/// ```
/// use core_playback::progress_percent;
///
/// assert_eq!(progress_percent(30.0, Some(120.0)), 25);
/// assert_eq!(progress_percent(10.0, Some(0.0)), 0);
/// assert_eq!(progress_percent(10.0, None), 0);
/// ```
pub fn progress_percent(current_time: f64, duration: Option<f64>) -> u8 {
    let Some(duration) = duration.filter(|d| d.is_finite()) else {
        return 0;
    };
    let duration = duration.round();
    if duration <= 0.0 || !current_time.is_finite() {
        return 0;
    }

    let percent = (current_time.round() / duration * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}
