//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the player crates:
//! - Logging and tracing setup
//! - Configuration with fail-fast validation
//! - Event bus for user-visible notifications
//!
//! Environmental failures (store unavailable, unreadable upload, device
//! errors) never abort the core. They are logged and published on the
//! [`events::EventBus`] so the UI can show a non-blocking notice.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
