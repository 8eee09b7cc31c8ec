//! # Persistence Write Queue
//!
//! A single background writer serializes every write to the library store.
//! Callers enqueue snapshots without waiting; the writer drains whatever is
//! queued, keeps only the newest library snapshot and the newest resume
//! point, and writes those. Overlapping saves therefore never interleave, and
//! the store always ends up holding the last snapshot enqueued.
//!
//! Write failures are logged and published as
//! [`LibraryEvent::PersistenceFailed`]; they never reach the caller.

use crate::models::{ResumePoint, TrackRecord};
use crate::store::{ResumePointStore, TrackCollectionStore};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum Command {
    Library(Vec<TrackRecord>),
    Resume(ResumePoint),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background persistence writer.
///
/// Dropping the handle without calling [`close`](Self::close) lets the
/// writer finish what is already queued and then stop.
pub struct PersistenceQueue {
    sender: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceQueue {
    /// Spawn the writer task on the current Tokio runtime.
    pub fn spawn(
        library_store: Arc<dyn TrackCollectionStore>,
        resume_store: Arc<dyn ResumePointStore>,
        events: EventBus,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = Writer {
            library_store,
            resume_store,
            events,
        };
        let worker = tokio::spawn(writer.run(receiver));

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue a full replacement of the stored collection.
    pub fn save_library(&self, records: Vec<TrackRecord>) {
        self.send(Command::Library(records));
    }

    /// Queue an overwrite of the resume point.
    pub fn save_resume_point(&self, point: ResumePoint) {
        self.send(Command::Resume(point));
    }

    /// Wait until everything queued before this call has been written.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(Command::Flush(tx)) {
            rx.await.ok();
        }
    }

    /// Flush pending writes and stop the writer. Later saves are ignored.
    pub async fn close(&mut self) {
        self.flush().await;
        self.sender = None;

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Persistence writer ended abnormally");
            }
        }
        info!("Persistence queue closed");
    }

    pub fn is_closed(&self) -> bool {
        self.sender.as_ref().map_or(true, |sender| sender.is_closed())
    }

    fn send(&self, command: Command) -> bool {
        let Some(sender) = &self.sender else {
            debug!("Persistence queue closed, dropping write");
            return false;
        };

        if sender.send(command).is_err() {
            warn!("Persistence writer is gone, dropping write");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for PersistenceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceQueue")
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct Writer {
    library_store: Arc<dyn TrackCollectionStore>,
    resume_store: Arc<dyn ResumePointStore>,
    events: EventBus,
}

#[derive(Default)]
struct Batch {
    library: Option<Vec<TrackRecord>>,
    resume: Option<ResumePoint>,
    waiters: Vec<oneshot::Sender<()>>,
    coalesced: usize,
}

impl Batch {
    fn push(&mut self, command: Command) {
        match command {
            Command::Library(records) => {
                if self.library.replace(records).is_some() {
                    self.coalesced += 1;
                }
            }
            Command::Resume(point) => {
                if self.resume.replace(point).is_some() {
                    self.coalesced += 1;
                }
            }
            Command::Flush(waiter) => self.waiters.push(waiter),
        }
    }
}

impl Writer {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        debug!("Persistence writer started");

        while let Some(first) = receiver.recv().await {
            let mut batch = Batch::default();
            batch.push(first);
            while let Ok(command) = receiver.try_recv() {
                batch.push(command);
            }

            if batch.coalesced > 0 {
                debug!(skipped = batch.coalesced, "Coalesced queued writes");
            }

            self.write(batch).await;
        }

        debug!("Persistence writer stopped");
    }

    async fn write(&self, batch: Batch) {
        if let Some(records) = batch.library {
            if let Err(e) = self.library_store.save_library(&records).await {
                self.report("library", e.to_string());
            }
        }

        if let Some(point) = batch.resume {
            if let Err(e) = self.resume_store.save_resume_point(&point).await {
                self.report("resume_point", e.to_string());
            }
        }

        for waiter in batch.waiters {
            waiter.send(()).ok();
        }
    }

    fn report(&self, target: &str, message: String) {
        warn!(target_store = target, error = %message, "Persisting failed");
        self.events
            .emit(CoreEvent::Library(LibraryEvent::PersistenceFailed {
                target: target.to_string(),
                message,
            }))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LibraryError, Result};
    use crate::models::Track;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        libraries: Mutex<Vec<Vec<TrackRecord>>>,
        resume_points: Mutex<Vec<ResumePoint>>,
        fail: bool,
    }

    #[async_trait]
    impl TrackCollectionStore for RecordingStore {
        async fn save_library(&self, records: &[TrackRecord]) -> Result<()> {
            if self.fail {
                return Err(LibraryError::StoreUnavailable("disk full".into()));
            }
            self.libraries.lock().unwrap().push(records.to_vec());
            Ok(())
        }

        async fn load_library(&self) -> Result<Vec<TrackRecord>> {
            Ok(self.libraries.lock().unwrap().last().cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl ResumePointStore for RecordingStore {
        async fn save_resume_point(&self, point: &ResumePoint) -> Result<()> {
            if self.fail {
                return Err(LibraryError::StoreUnavailable("disk full".into()));
            }
            self.resume_points.lock().unwrap().push(point.clone());
            Ok(())
        }

        async fn load_resume_point(&self) -> Result<Option<ResumePoint>> {
            Ok(self.resume_points.lock().unwrap().last().cloned())
        }
    }

    fn snapshot(ids: &[&str]) -> Vec<TrackRecord> {
        ids.iter()
            .map(|id| TrackRecord::new(Track::new(*id, *id, "artist", "cover", "data:,"), false))
            .collect()
    }

    fn queue(store: &Arc<RecordingStore>, events: EventBus) -> PersistenceQueue {
        PersistenceQueue::spawn(store.clone(), store.clone(), events)
    }

    #[tokio::test]
    async fn test_overlapping_saves_end_with_last_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let queue = queue(&store, EventBus::default());

        queue.save_library(snapshot(&["a"]));
        queue.save_library(snapshot(&["a", "b"]));
        queue.save_library(snapshot(&["a", "b", "c"]));
        queue.flush().await;

        assert_eq!(
            store.load_library().await.unwrap(),
            snapshot(&["a", "b", "c"])
        );
        assert!(store.libraries.lock().unwrap().len() <= 3);
    }

    #[tokio::test]
    async fn test_resume_points_are_written() {
        let store = Arc::new(RecordingStore::default());
        let queue = queue(&store, EventBus::default());

        queue.save_resume_point(ResumePoint::new("a", 1.0));
        queue.save_resume_point(ResumePoint::new("a", 2.0));
        queue.flush().await;

        assert_eq!(
            store.load_resume_point().await.unwrap(),
            Some(ResumePoint::new("a", 2.0))
        );
    }

    #[tokio::test]
    async fn test_failure_publishes_event() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let events = EventBus::new(8);
        let mut subscriber = events.subscribe();
        let queue = queue(&store, events);

        queue.save_library(snapshot(&["a"]));
        queue.flush().await;

        match subscriber.recv().await.unwrap() {
            CoreEvent::Library(LibraryEvent::PersistenceFailed { target, message }) => {
                assert_eq!(target, "library");
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_flushes_and_ignores_later_writes() {
        let store = Arc::new(RecordingStore::default());
        let mut queue = queue(&store, EventBus::default());

        queue.save_library(snapshot(&["a"]));
        queue.close().await;
        assert!(queue.is_closed());
        assert_eq!(store.load_library().await.unwrap(), snapshot(&["a"]));

        queue.save_library(snapshot(&["b"]));
        queue.flush().await;
        assert_eq!(store.load_library().await.unwrap(), snapshot(&["a"]));
    }

    #[tokio::test]
    async fn test_dropped_queue_finishes_pending_writes() {
        let store = Arc::new(RecordingStore::default());
        let queue = queue(&store, EventBus::default());

        queue.save_library(snapshot(&["a", "b"]));
        drop(queue);

        for _ in 0..50 {
            if !store.libraries.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.load_library().await.unwrap(), snapshot(&["a", "b"]));
    }
}
