//! Native SQLite Library Store
//!
//! Implements [`TrackCollectionStore`] and [`ResumePointStore`] with `sqlx`
//! over a single database file.
//!
//! The pool is opened lazily by the first operation, so constructing the
//! store never fails. Open failures surface as
//! [`LibraryError::StoreUnavailable`] from that first operation, and the
//! next operation tries again.

use crate::db::{create_pool, DatabaseConfig};
use crate::error::{LibraryError, Result};
use crate::models::{ResumePoint, TrackRecord};
use crate::store::{ResumePointStore, TrackCollectionStore};
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// SQLite-backed store for the library and the resume point.
pub struct SqliteLibraryStore {
    config: DatabaseConfig,
    database_path: Option<PathBuf>,
    pool: OnceCell<Pool<Sqlite>>,
}

impl SqliteLibraryStore {
    /// Store backed by the database file at `path`. Missing parent
    /// directories are created on first use.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            config: DatabaseConfig::new(&path),
            database_path: Some(path),
            pool: OnceCell::new(),
        }
    }

    /// Private in-memory store, for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::with_config(DatabaseConfig::in_memory())
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            database_path: None,
            pool: OnceCell::new(),
        }
    }

    /// Open the pool now instead of on first use.
    pub async fn initialize(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    /// Close the pool if it was opened.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Library store closed");
        }
    }

    async fn pool(&self) -> Result<&Pool<Sqlite>> {
        self.pool
            .get_or_try_init(|| async {
                self.ensure_parent_dir().await?;
                create_pool(self.config.clone()).await
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Library store could not be opened");
                match e {
                    LibraryError::StoreUnavailable(_) => e,
                    other => LibraryError::StoreUnavailable(other.to_string()),
                }
            })
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        let Some(parent) = self.database_path.as_deref().and_then(Path::parent) else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LibraryError::StoreUnavailable(format!("cannot create data directory: {e}")))
    }
}

impl std::fmt::Debug for SqliteLibraryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLibraryStore")
            .field("database_url", &self.config.database_url)
            .field("initialized", &self.pool.initialized())
            .finish()
    }
}

#[async_trait]
impl TrackCollectionStore for SqliteLibraryStore {
    async fn save_library(&self, records: &[TrackRecord]) -> Result<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tracks").execute(&mut *tx).await?;

        for (position, record) in records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tracks (id, position, name, artist, cover, audio, active)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.track.id)
            .bind(position as i64)
            .bind(&record.track.name)
            .bind(&record.track.artist)
            .bind(&record.track.cover)
            .bind(&record.track.audio)
            .bind(record.active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(tracks = records.len(), "Library saved");
        Ok(())
    }

    async fn load_library(&self) -> Result<Vec<TrackRecord>> {
        let pool = self.pool().await?;

        let records = sqlx::query_as::<_, TrackRecord>(
            "SELECT id, name, artist, cover, audio, active FROM tracks ORDER BY position",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| LibraryError::StoreUnavailable(e.to_string()))?;

        debug!(tracks = records.len(), "Library loaded");
        Ok(records)
    }
}

#[async_trait]
impl ResumePointStore for SqliteLibraryStore {
    async fn save_resume_point(&self, point: &ResumePoint) -> Result<()> {
        let pool = self.pool().await?;

        sqlx::query(
            r#"
            INSERT INTO resume_point (slot, track_id, position_secs, updated_at)
            VALUES (0, ?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                track_id = excluded.track_id,
                position_secs = excluded.position_secs,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&point.last_track_id)
        .bind(point.last_position_seconds)
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;

        debug!(
            track_id = %point.last_track_id,
            position_secs = point.last_position_seconds,
            "Resume point saved"
        );
        Ok(())
    }

    async fn load_resume_point(&self) -> Result<Option<ResumePoint>> {
        let pool = self.pool().await?;

        let row: Option<(String, f64)> =
            sqlx::query_as("SELECT track_id, position_secs FROM resume_point WHERE slot = 0")
                .fetch_optional(pool)
                .await
                .map_err(|e| LibraryError::StoreUnavailable(e.to_string()))?;

        Ok(row.map(|(track_id, position)| ResumePoint::new(track_id, position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;

    fn record(id: &str, active: bool) -> TrackRecord {
        TrackRecord::new(
            Track::new(id, format!("name-{id}"), "Unknown Artist", "cover", "data:audio/mpeg;base64,AA=="),
            active,
        )
    }

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let store = SqliteLibraryStore::in_memory();
        assert!(store.load_library().await.unwrap().is_empty());
        assert!(store.load_resume_point().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_order_and_flags() {
        let store = SqliteLibraryStore::in_memory();
        let records = vec![record("c", false), record("a", true), record("b", false)];

        store.save_library(&records).await.unwrap();

        assert_eq!(store.load_library().await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_collection() {
        let store = SqliteLibraryStore::in_memory();
        store
            .save_library(&[record("a", false), record("b", false)])
            .await
            .unwrap();
        store.save_library(&[record("z", true)]).await.unwrap();

        let loaded = store.load_library().await.unwrap();
        assert_eq!(loaded, vec![record("z", true)]);

        store.save_library(&[]).await.unwrap();
        assert!(store.load_library().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_collection() {
        let store = SqliteLibraryStore::in_memory();
        let original = vec![record("a", true)];
        store.save_library(&original).await.unwrap();

        // Duplicate primary key aborts the transaction half way
        let result = store
            .save_library(&[record("x", false), record("x", false)])
            .await;
        assert!(matches!(result, Err(LibraryError::Database(_))));

        assert_eq!(store.load_library().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_resume_point_last_write_wins() {
        let store = SqliteLibraryStore::in_memory();

        store
            .save_resume_point(&ResumePoint::new("a", 10.0))
            .await
            .unwrap();
        store
            .save_resume_point(&ResumePoint::new("b", 42.5))
            .await
            .unwrap();

        assert_eq!(
            store.load_resume_point().await.unwrap(),
            Some(ResumePoint::new("b", 42.5))
        );
    }

    #[tokio::test]
    async fn test_unopenable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        let store = SqliteLibraryStore::open(blocker.join("player.db"));

        assert!(matches!(
            store.load_library().await,
            Err(LibraryError::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.save_library(&[]).await,
            Err(LibraryError::StoreUnavailable(_))
        ));
    }
}
