//! # Playback Module
//!
//! Drives the host audio device from the track library.
//!
//! ## Overview
//!
//! - [`controller::PlaybackController`]: the `Empty → Idle ⇄ Playing` state
//!   machine, owner of the current-track marker
//! - [`state`]: snapshot types rendered by the UI, and progress math
//!
//! The controller never blocks on storage. Library snapshots and resume
//! points go through [`core_library::PersistenceQueue`].

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{ControllerOptions, PlaybackController};
pub use error::{PlaybackError, Result};
pub use state::{progress_percent, PlaybackState, PlaybackStatus, Position};
