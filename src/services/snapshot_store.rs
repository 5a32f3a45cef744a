//! # Snapshot Storage
//!
//! Durable homes for table snapshots. The file store keeps one JSON document
//! per snapshot, written to a temporary file, synced and renamed into place so
//! a crash never leaves a half-written snapshot behind.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StandingsError, StandingsResult};
use crate::models::{LeagueSeasonKey, Snapshot};

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, snapshot: &Snapshot) -> StandingsResult<()>;

    async fn load(&self, id: Uuid) -> StandingsResult<Option<Snapshot>>;

    /// Snapshots for `key`, newest first
    async fn list(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<Snapshot>>;

    /// Remove a snapshot; `false` if it did not exist
    async fn delete(&self, id: Uuid) -> StandingsResult<bool>;

    async fn health_check(&self) -> StandingsResult<()>;
}

fn newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<Uuid, Snapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> StandingsResult<()> {
        self.snapshots.write().insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> StandingsResult<Option<Snapshot>> {
        Ok(self.snapshots.read().get(&id).cloned())
    }

    async fn list(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .read()
            .values()
            .filter(|s| s.key == key)
            .cloned()
            .collect();
        newest_first(&mut snapshots);
        Ok(snapshots)
    }

    async fn delete(&self, id: Uuid) -> StandingsResult<bool> {
        Ok(self.snapshots.write().remove(&id).is_some())
    }

    async fn health_check(&self) -> StandingsResult<()> {
        Ok(())
    }
}

/// One `<id>.json` file per snapshot under a storage directory
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Open the store, creating `dir` if needed
    pub async fn open(dir: impl Into<PathBuf>) -> StandingsResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "📁 Snapshot store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_snapshot(path: &Path) -> StandingsResult<Option<Snapshot>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_all(&self) -> StandingsResult<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_snapshot(&path).await {
                Ok(Some(snapshot)) => snapshots.push(snapshot),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot file");
                }
            }
        }
        Ok(snapshots)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> StandingsResult<()> {
        let path = self.path_for(snapshot.id);
        let temp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp, &path).await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> StandingsResult<Option<Snapshot>> {
        Self::read_snapshot(&self.path_for(id)).await
    }

    async fn list(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|s| s.key == key)
            .collect();
        newest_first(&mut snapshots);
        Ok(snapshots)
    }

    async fn delete(&self, id: Uuid) -> StandingsResult<bool> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> StandingsResult<()> {
        let metadata = tokio::fs::metadata(&self.dir).await?;
        if !metadata.is_dir() {
            return Err(StandingsError::transient(
                "snapshot_store_health",
                format!("{} is not a directory", self.dir.display()),
            ));
        }
        if metadata.permissions().readonly() {
            return Err(StandingsError::transient(
                "snapshot_store_health",
                format!("{} is read-only", self.dir.display()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn snapshot(key: LeagueSeasonKey, age_minutes: i64) -> Snapshot {
        Snapshot {
            id: Uuid::new_v4(),
            key,
            created_at: Utc::now() - Duration::minutes(age_minutes),
            description: Some("before correction".into()),
            entries: Vec::new(),
            size_bytes: 2,
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path().join("snapshots")).await.unwrap();
        let key = LeagueSeasonKey::new(1, 2025);
        let saved = snapshot(key, 0);

        store.save(&saved).await.unwrap();
        assert_eq!(store.load(saved.id).await.unwrap(), Some(saved.clone()));
        assert!(store.dir().join(format!("{}.json", saved.id)).exists());
        assert!(!store.dir().join(format!("{}.json.tmp", saved.id)).exists());
        store.health_check().await.unwrap();

        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert_eq!(store.load(saved.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_lists_by_key_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).await.unwrap();
        let key = LeagueSeasonKey::new(1, 2025);
        let old = snapshot(key, 30);
        let new = snapshot(key, 1);
        store.save(&old).await.unwrap();
        store.save(&new).await.unwrap();
        store.save(&snapshot(LeagueSeasonKey::new(2, 2025), 0)).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"ignored").await.unwrap();

        let ids: Vec<Uuid> = store.list(key).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySnapshotStore::new();
        let key = LeagueSeasonKey::new(4, 2024);
        let saved = snapshot(key, 0);
        store.save(&saved).await.unwrap();
        assert_eq!(store.list(key).await.unwrap().len(), 1);
        assert!(store.delete(saved.id).await.unwrap());
        assert!(store.list(key).await.unwrap().is_empty());
    }
}
