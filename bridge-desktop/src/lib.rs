//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! - [`LocalFileBlob`]: a file on disk handed to ingestion, read with `tokio::fs`
//! - [`HeadlessAudioDevice`]: an [`AudioDevice`](bridge_traits::AudioDevice)
//!   without audio output that logs commands and reports readiness at once
//! - [`default_data_dir`]: where the player database lives by default
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessAudioDevice, LocalFileBlob};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (device, device_events) = HeadlessAudioDevice::with_events(32);
//!     let blob = LocalFileBlob::new("/home/user/Music/song.mp3");
//!
//!     // Use in core configuration
//! }
//! ```

mod device;
mod filesystem;

pub use device::HeadlessAudioDevice;
pub use filesystem::{default_data_dir, LocalFileBlob};
