//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from its host but cannot provide
//! itself.
//!
//! ## Traits
//!
//! - [`AudioDevice`](playback::AudioDevice) - the native audio element the
//!   controller drives (set source, play, pause, seek, unload)
//! - [`FileBlob`](storage::FileBlob) - a user-supplied file to ingest
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to the host
//!
//! ## Platform Implementations
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Tests    | [`MemoryBlob`](storage::MemoryBlob), mock devices |
//!
//! ## Error Handling
//!
//! Every bridge call returns [`BridgeError`](error::BridgeError). Adapters
//! convert platform errors into it and keep the message actionable (file
//! name, device state).
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` so implementations can be shared behind
//! `Arc` between the service and its device event task.

pub mod error;
pub mod logging;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{AudioDevice, DeviceEvent};
pub use storage::{FileBlob, MemoryBlob};
