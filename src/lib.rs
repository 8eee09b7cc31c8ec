//! Workspace umbrella crate.
//!
//! Hosts depend on `player-workspace` and pick features instead of wiring
//! the individual crates (`core-service`, `core-library`, `core-playback`)
//! themselves. The default `desktop-shims` feature pulls in the service
//! façade with the desktop bridge adapters.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "library")]
pub use core_library as library;

#[cfg(feature = "playback")]
pub use core_playback as playback;
