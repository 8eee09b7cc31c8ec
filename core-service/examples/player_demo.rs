//! Headless player walkthrough
//!
//! Ingests the audio files given on the command line, plays through them with
//! simulated progress and shows the session being restored on the next run.
//!
//! Run with:
//! ```bash
//! cargo run --example player_demo --package core-service -- song.mp3 other.flac
//!
//! # Keep the database somewhere specific
//! PLAYER_DB=/tmp/player.db cargo run --example player_demo --package core-service
//! ```

use bridge_desktop::HeadlessAudioDevice;
use bridge_traits::logging::LogLevel;
use bridge_traits::playback::DeviceEvent;
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{bootstrap, PlayerService};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let (device, device_events) = HeadlessAudioDevice::with_events(32);
    let mut builder = CoreConfig::builder().audio_device(Arc::new(device));
    if let Ok(path) = env::var("PLAYER_DB") {
        builder = builder.database_path(path);
    }
    let config = builder.build()?;
    info!(database = %config.database_path.display(), "Opening player");

    let player = bootstrap(config).await?;
    let mut notices = player.subscribe();
    let pump = player.attach_device_events(device_events);

    for path in env::args().skip(1) {
        match player.ingest_path(&path).await? {
            Some(track) => info!(name = %track.name, "Added"),
            None => warn!(path = %path, "Skipped"),
        }
    }

    print_library(&player).await;

    if player.state().await.current_track_id.is_some() {
        player.play().await?;
        simulate_track(&player, 180.0).await?;
        player.handle_device_event(DeviceEvent::Ended).await?;
        simulate_track(&player, 30.0).await?;
        player.pause().await?;
    } else {
        info!("Library is empty, pass audio files as arguments");
    }

    print_library(&player).await;
    player.shutdown().await;
    pump.abort();

    while let Ok(event) = notices.try_recv() {
        info!(severity = ?event.severity(), "{}", event.description());
    }
    Ok(())
}

async fn simulate_track(player: &PlayerService, duration: f64) -> core_service::Result<()> {
    for step in 1..=4 {
        let current_time = duration * f64::from(step) / 4.0 - 1.0;
        player
            .handle_device_event(DeviceEvent::progress(current_time, duration))
            .await?;
        let position = player.state().await.position;
        info!(
            seconds = position.current_time,
            percent = position.progress_percent,
            "Progress"
        );
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    Ok(())
}

async fn print_library(player: &PlayerService) {
    for record in player.tracks().await {
        let marker = if record.active { ">" } else { " " };
        println!("{marker} {} - {}", record.track.name, record.track.artist);
    }
}
