//! End-to-end service tests: SQLite on disk, headless device, event bus

use async_trait::async_trait;
use bridge_desktop::HeadlessAudioDevice;
use bridge_traits::playback::AudioDevice;
use bridge_traits::storage::{FileBlob, MemoryBlob};
use core_library::{
    LibraryError, ResumePoint, ResumePointStore, TrackCollectionStore, TrackRecord,
};
use core_playback::PlaybackStatus;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_service::{bootstrap, PlayerDependencies, PlayerService};
use mockall::mock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

mock! {
    Store {}

    #[async_trait]
    impl TrackCollectionStore for Store {
        async fn save_library(&self, records: &[TrackRecord]) -> core_library::Result<()>;
        async fn load_library(&self) -> core_library::Result<Vec<TrackRecord>>;
    }

    #[async_trait]
    impl ResumePointStore for Store {
        async fn save_resume_point(&self, point: &ResumePoint) -> core_library::Result<()>;
        async fn load_resume_point(&self) -> core_library::Result<Option<ResumePoint>>;
    }
}

fn config(path: &Path, device: Arc<dyn AudioDevice>) -> CoreConfig {
    CoreConfig::builder()
        .database_path(path)
        .audio_device(device)
        .build()
        .unwrap()
}

fn mp3(name: &str) -> MemoryBlob {
    MemoryBlob::new(name, vec![0x49u8, 0x44, 0x33])
}

fn drain(events: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test]
async fn ingest_persists_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("player.db");

    let player = bootstrap(config(&db, Arc::new(HeadlessAudioDevice::new())))
        .await
        .unwrap();
    assert_eq!(player.state().await.status, PlaybackStatus::Empty);

    let first = player.ingest_file(&mp3("first.mp3")).await.unwrap().unwrap();
    let second = player.ingest_file(&mp3("second.mp3")).await.unwrap().unwrap();
    assert_eq!(first.name, "first");
    assert!(first.id.starts_with("upload-"));
    assert_eq!(player.current_track().await.unwrap().id, second.id);

    player.seek(12.0).await.unwrap();
    player.shutdown().await;

    let reopened = bootstrap(config(&db, Arc::new(HeadlessAudioDevice::new())))
        .await
        .unwrap();
    let tracks = reopened.tracks().await;
    assert_eq!(
        tracks.iter().map(|r| r.track.name.as_str()).collect::<Vec<_>>(),
        vec!["first", "second"]
    );

    let state = reopened.state().await;
    assert_eq!(state.status, PlaybackStatus::Idle);
    assert_eq!(state.current_track_id.as_deref(), Some(second.id.as_str()));
    assert_eq!(state.position.current_time, 12.0);
    reopened.shutdown().await;
}

#[tokio::test]
async fn unreadable_file_is_skipped_with_event() {
    let dir = tempfile::tempdir().unwrap();
    let player = bootstrap(config(
        &dir.path().join("player.db"),
        Arc::new(HeadlessAudioDevice::new()),
    ))
    .await
    .unwrap();
    let mut events = player.subscribe();

    let result = player
        .ingest_file(&MemoryBlob::unreadable("broken.mp3"))
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(player.tracks().await.is_empty());

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Library(LibraryEvent::IngestFailed { file_name, .. }) if file_name == "broken.mp3"
    )));
    player.shutdown().await;
}

#[tokio::test]
async fn ingest_files_skips_unreadable_and_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let player = bootstrap(config(
        &dir.path().join("player.db"),
        Arc::new(HeadlessAudioDevice::new()),
    ))
    .await
    .unwrap();

    let one = mp3("one.mp3");
    let broken = MemoryBlob::unreadable("broken.mp3");
    let two = mp3("two.ogg");
    let blobs: [&dyn FileBlob; 3] = [&one, &broken, &two];
    let ingested = player.ingest_files(&blobs).await.unwrap();

    assert_eq!(
        ingested.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["one", "two"]
    );
    assert_eq!(player.tracks().await.len(), 2);
    player.shutdown().await;
}

#[tokio::test]
async fn select_on_ingest_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig::builder()
        .database_path(dir.path().join("player.db"))
        .audio_device(Arc::new(HeadlessAudioDevice::new()))
        .select_on_ingest(false)
        .build()
        .unwrap();
    let player = bootstrap(config).await.unwrap();

    let first = player.ingest_file(&mp3("a.mp3")).await.unwrap().unwrap();
    player.ingest_file(&mp3("b.mp3")).await.unwrap().unwrap();

    assert_eq!(player.current_track().await.unwrap().id, first.id);
    player.shutdown().await;
}

#[tokio::test]
async fn unavailable_store_starts_empty_session() {
    let mut store = MockStore::new();
    store
        .expect_load_library()
        .returning(|| Err(LibraryError::StoreUnavailable("locked by another process".into())));
    store.expect_load_resume_point().never();
    store.expect_save_library().returning(|_| Ok(()));
    store.expect_save_resume_point().returning(|_| Ok(()));
    let store = Arc::new(store);

    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let player = PlayerService::start_with_events(
        config(&dir.path().join("unused.db"), Arc::new(HeadlessAudioDevice::new())),
        PlayerDependencies::new(store.clone(), store),
        bus,
    )
    .await
    .unwrap();

    assert_eq!(player.state().await.status, PlaybackStatus::Empty);
    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Library(LibraryEvent::StoreUnavailable { message }) if message.contains("locked")
    )));

    // The session stays usable.
    player.ingest_file(&mp3("late.mp3")).await.unwrap().unwrap();
    assert_eq!(player.state().await.status, PlaybackStatus::Idle);
    player.shutdown().await;
}

#[tokio::test]
async fn failed_writes_are_reported_not_returned() {
    let mut store = MockStore::new();
    store.expect_load_library().returning(|| Ok(Vec::new()));
    store.expect_load_resume_point().returning(|| Ok(None));
    store
        .expect_save_library()
        .returning(|_| Err(LibraryError::StoreUnavailable("disk full".into())));
    store.expect_save_resume_point().returning(|_| Ok(()));
    let store = Arc::new(store);

    let dir = tempfile::tempdir().unwrap();
    let player = PlayerService::start(
        config(&dir.path().join("unused.db"), Arc::new(HeadlessAudioDevice::new())),
        PlayerDependencies::new(store.clone(), store),
    )
    .await
    .unwrap();
    let mut events = player.subscribe();

    assert!(player.ingest_file(&mp3("a.mp3")).await.unwrap().is_some());
    player.flush().await;

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Library(LibraryEvent::PersistenceFailed { target, .. }) if target == "library"
    )));
    player.shutdown().await;
}

#[tokio::test]
async fn device_events_drive_playback() {
    let dir = tempfile::tempdir().unwrap();
    let (device, device_events) = HeadlessAudioDevice::with_events(16);
    let device = Arc::new(device);
    let player = bootstrap(config(&dir.path().join("player.db"), device.clone()))
        .await
        .unwrap();
    let pump = player.attach_device_events(device_events);

    player.ingest_file(&mp3("a.mp3")).await.unwrap().unwrap();
    player.play().await.unwrap();

    let mut playing = false;
    for _ in 0..100 {
        if device.is_playing().await {
            playing = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(playing);
    assert_eq!(player.state().await.status, PlaybackStatus::Playing);

    player.pause().await.unwrap();
    assert!(!device.is_playing().await);

    player.shutdown().await;
    pump.abort();
}

#[cfg(feature = "desktop-shims")]
#[tokio::test]
async fn ingest_path_reads_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Field Recording.flac");
    std::fs::write(&file, [1u8, 2, 3]).unwrap();

    let player = bootstrap(config(
        &dir.path().join("player.db"),
        Arc::new(HeadlessAudioDevice::new()),
    ))
    .await
    .unwrap();

    let track = player.ingest_path(&file).await.unwrap().unwrap();
    assert_eq!(track.name, "Field Recording");
    assert_eq!(track.audio, "data:audio/flac;base64,AQID");

    assert!(player
        .ingest_path(dir.path().join("missing.mp3"))
        .await
        .unwrap()
        .is_none());
    player.shutdown().await;
}
