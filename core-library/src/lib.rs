//! # Library Management Module
//!
//! Owns the track collection and everything that feeds or persists it.
//!
//! ## Overview
//!
//! - [`repository::Library`]: ordered tracks plus the single active id
//! - [`store`]: persistence interfaces for the collection and the resume point
//! - [`adapters::SqliteLibraryStore`]: SQLite implementation with migrations
//! - [`persistence::PersistenceQueue`]: single background writer that
//!   coalesces overlapping saves
//! - [`ingest::Ingestor`]: turns host files into tracks

pub mod adapters;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod persistence;
pub mod repository;
pub mod store;

pub use adapters::SqliteLibraryStore;
pub use error::{LibraryError, Result};
pub use ingest::{IngestOptions, Ingestor};
pub use models::{ResumePoint, Track, TrackRecord};
pub use persistence::PersistenceQueue;
pub use repository::Library;
pub use store::{ResumePointStore, TrackCollectionStore};
