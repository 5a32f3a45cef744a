//! # Snapshot Service
//!
//! Point-in-time copies of a league/season table for protection and recovery.
//! Creating a snapshot never touches the live rows; restoring one replaces
//! them while holding the table lock, so a restore cannot interleave with a
//! running recalculation of the same table.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::snapshot_store::SnapshotStore;
use crate::config::SnapshotConfig;
use crate::error::{StandingsError, StandingsResult};
use crate::logging::log_snapshot_operation;
use crate::models::{LeagueSeasonKey, Snapshot, SnapshotSummary};
use crate::orchestration::LockRegistry;
use crate::repository::TableEntryRepository;

pub struct SnapshotService {
    entries: Arc<dyn TableEntryRepository>,
    store: Arc<dyn SnapshotStore>,
    locks: Arc<LockRegistry>,
    config: SnapshotConfig,
}

impl std::fmt::Debug for SnapshotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SnapshotService {
    pub fn new(
        entries: Arc<dyn TableEntryRepository>,
        store: Arc<dyn SnapshotStore>,
        locks: Arc<LockRegistry>,
        config: SnapshotConfig,
    ) -> Self {
        Self {
            entries,
            store,
            locks,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Copy the current rows for `key` into a new snapshot
    pub async fn create(
        &self,
        key: LeagueSeasonKey,
        description: Option<String>,
    ) -> StandingsResult<Uuid> {
        let entries = self.entries.find_entries(key).await?;
        let size_bytes = serde_json::to_vec(&entries)?.len() as u64;
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            key,
            created_at: Utc::now(),
            description,
            entries,
            size_bytes,
        };

        self.store.save(&snapshot).await?;
        log_snapshot_operation(
            "create",
            Some(&snapshot.id.to_string()),
            Some(key.league_id),
            Some(key.season_id),
            "created",
            Some(snapshot.entries.len()),
        );

        let removed = self.apply_retention(key).await?;
        if !removed.is_empty() {
            debug!(key = %key, removed = removed.len(), "Retention pruned old snapshots");
        }
        Ok(snapshot.id)
    }

    pub async fn list(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<SnapshotSummary>> {
        Ok(self
            .store
            .list(key)
            .await?
            .iter()
            .map(Snapshot::summary)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> StandingsResult<Snapshot> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| StandingsError::not_found("snapshot", id))
    }

    /// Replace the live rows of the snapshot's table with the stored copy
    pub async fn restore(&self, id: Uuid) -> StandingsResult<SnapshotSummary> {
        let snapshot = self.get(id).await?;
        let key = snapshot.key;
        let holder = Uuid::new_v4();

        let guard = self
            .locks
            .acquire(key, holder, self.config.lock_wait_timeout())
            .await?;
        let summary = snapshot.summary();
        self.entries.replace_entries(key, snapshot.entries).await?;
        drop(guard);

        log_snapshot_operation(
            "restore",
            Some(&id.to_string()),
            Some(key.league_id),
            Some(key.season_id),
            "restored",
            Some(summary.entry_count),
        );
        Ok(summary)
    }

    pub async fn delete(&self, id: Uuid) -> StandingsResult<()> {
        if !self.store.delete(id).await? {
            return Err(StandingsError::not_found("snapshot", id));
        }
        log_snapshot_operation("delete", Some(&id.to_string()), None, None, "deleted", None);
        Ok(())
    }

    /// Drop snapshots beyond `max_per_table` or older than `max_age_days`
    ///
    /// Newest snapshots are kept. Returns the ids that were removed.
    pub async fn apply_retention(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<Uuid>> {
        let snapshots = self.store.list(key).await?;
        let cutoff = self
            .config
            .max_age_days
            .map(|days| Utc::now() - ChronoDuration::days(i64::from(days)));

        let mut removed = Vec::new();
        for (index, snapshot) in snapshots.iter().enumerate() {
            let over_count = index >= self.config.max_per_table;
            let too_old = cutoff.map_or(false, |cutoff| snapshot.created_at < cutoff);
            if over_count || too_old {
                if self.store.delete(snapshot.id).await? {
                    removed.push(snapshot.id);
                }
            }
        }

        if !removed.is_empty() {
            info!(
                key = %key,
                removed = removed.len(),
                max_per_table = self.config.max_per_table,
                max_age_days = ?self.config.max_age_days,
                "🧹 Snapshot retention applied"
            );
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Side, TableEntry};
    use crate::repository::InMemoryRepository;
    use crate::services::snapshot_store::InMemorySnapshotStore;
    use std::time::Duration;

    fn key() -> LeagueSeasonKey {
        LeagueSeasonKey::new(5, 2025)
    }

    fn rows() -> Vec<TableEntry> {
        let mut first = TableEntry::empty(key(), &Side::new(1, "A"));
        first.rank = 1;
        let mut second = TableEntry::empty(key(), &Side::new(2, "B"));
        second.rank = 2;
        vec![first, second]
    }

    fn service(config: SnapshotConfig) -> (Arc<InMemoryRepository>, Arc<LockRegistry>, SnapshotService) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.set_entries(key(), rows());
        let locks = Arc::new(LockRegistry::new());
        let service = SnapshotService::new(
            repo.clone(),
            Arc::new(InMemorySnapshotStore::new()),
            locks.clone(),
            config,
        );
        (repo, locks, service)
    }

    #[tokio::test]
    async fn test_create_restore_round_trip() {
        let (repo, _, service) = service(SnapshotConfig::default());
        let id = service.create(key(), Some("matchday 3".into())).await.unwrap();
        repo.set_entries(key(), Vec::new());

        let summary = service.restore(id).await.unwrap();
        assert_eq!(summary.entry_count, 2);
        assert_eq!(repo.entries(key()), rows());
        assert!(service.get(id).await.unwrap().size_bytes > 0);
    }

    #[tokio::test]
    async fn test_unknown_snapshot_is_not_found() {
        let (_, _, service) = service(SnapshotConfig::default());
        let err = service.restore(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let (_, _, service) = service(SnapshotConfig::default());
        let id = service.create(key(), None).await.unwrap();
        service.delete(id).await.unwrap();
        assert!(matches!(
            service.delete(id).await,
            Err(StandingsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_retention_keeps_newest() {
        let config = SnapshotConfig {
            max_per_table: 2,
            ..SnapshotConfig::default()
        };
        let (_, _, service) = service(config);
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(service.create(key(), None).await.unwrap());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let kept: Vec<Uuid> = service.list(key()).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(kept, vec![ids[3], ids[2]]);
    }

    /// Rows read normally but writes never finish
    struct StalledWrites;

    #[async_trait::async_trait]
    impl TableEntryRepository for StalledWrites {
        async fn find_entries(&self, _key: LeagueSeasonKey) -> StandingsResult<Vec<TableEntry>> {
            Ok(rows())
        }

        async fn replace_entries(
            &self,
            _key: LeagueSeasonKey,
            _entries: Vec<TableEntry>,
        ) -> StandingsResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_restore_releases_table_lock() {
        let locks = Arc::new(LockRegistry::new());
        let service = SnapshotService::new(
            Arc::new(StalledWrites),
            Arc::new(InMemorySnapshotStore::new()),
            locks.clone(),
            SnapshotConfig::default(),
        );
        let id = service.create(key(), None).await.unwrap();

        let abandoned = tokio::time::timeout(Duration::from_millis(30), service.restore(id)).await;
        assert!(abandoned.is_err());
        assert!(!locks.is_locked(&key()));
    }

    #[tokio::test]
    async fn test_restore_waits_for_table_lock() {
        let config = SnapshotConfig {
            lock_wait_timeout_ms: 30,
            ..SnapshotConfig::default()
        };
        let (_, locks, service) = service(config);
        let id = service.create(key(), None).await.unwrap();
        locks.try_acquire(key(), Uuid::new_v4());

        let err = service.restore(id).await.unwrap_err();
        assert!(matches!(err, StandingsError::ConcurrencyTimeout { .. }));
    }
}
