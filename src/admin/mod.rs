//! # Administrative Facade
//!
//! [`StandingsAutomation`] wires the engine together from a configuration and
//! the platform's repositories, and exposes the administrative operations.
//! Every call answers with an [`ApiResponse`]; failures never escape as panics
//! or bare errors.

pub mod response_types;

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub use response_types::{ApiError, ApiResponse};

use crate::config::StandingsConfig;
use crate::constants::components;
use crate::error::{ErrorKind, StandingsError, StandingsResult};
use crate::hooks::{dispatch_hook, HookEvent};
use crate::logging::log_error;
use crate::models::{CalculationJob, JobPriority, LeagueSeasonKey, SnapshotSummary};
use crate::orchestration::{
    ComponentCheck, HealthReport, HealthStatus, LifecycleTrigger, LockRegistry,
    MatchLifecycleHooks, QueueManager, QueueStatus, TableCalculator,
};
use crate::repository::{LeagueRepository, MatchRepository, TableEntryRepository};
use crate::services::{FileSnapshotStore, InMemorySnapshotStore, SnapshotService, SnapshotStore};
use crate::validation::validate_table_key;

pub struct StandingsAutomation {
    config: StandingsConfig,
    queue: QueueManager,
    trigger: Arc<LifecycleTrigger>,
    snapshots: SnapshotService,
}

impl std::fmt::Debug for StandingsAutomation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandingsAutomation")
            .field("queue", &self.queue)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl StandingsAutomation {
    /// Build the engine; snapshots go to `snapshots.storage_dir` when set
    pub async fn new(
        config: StandingsConfig,
        matches: Arc<dyn MatchRepository>,
        entries: Arc<dyn TableEntryRepository>,
        leagues: Arc<dyn LeagueRepository>,
    ) -> StandingsResult<Self> {
        let store: Arc<dyn SnapshotStore> = match &config.snapshots.storage_dir {
            Some(dir) => Arc::new(FileSnapshotStore::open(dir).await?),
            None => Arc::new(InMemorySnapshotStore::new()),
        };
        Self::with_snapshot_store(config, matches, entries, leagues, store)
    }

    pub fn with_snapshot_store(
        config: StandingsConfig,
        matches: Arc<dyn MatchRepository>,
        entries: Arc<dyn TableEntryRepository>,
        leagues: Arc<dyn LeagueRepository>,
        store: Arc<dyn SnapshotStore>,
    ) -> StandingsResult<Self> {
        config.validate()?;

        let locks = Arc::new(LockRegistry::new());
        let calculator = Arc::new(TableCalculator::new(matches, entries.clone(), leagues));
        let queue = QueueManager::new(
            config.queue.clone(),
            config.backoff.clone(),
            config.health.clone(),
            calculator,
            locks.clone(),
        );
        let trigger = Arc::new(LifecycleTrigger::new(
            Arc::new(queue.clone()),
            config.triggers.enabled,
        ));
        let snapshots = SnapshotService::new(entries, store, locks, config.snapshots.clone());

        Ok(Self {
            config,
            queue,
            trigger,
            snapshots,
        })
    }

    pub fn config(&self) -> &StandingsConfig {
        &self.config
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn snapshots(&self) -> &SnapshotService {
        &self.snapshots
    }

    /// The hook implementation to register with the platform
    pub fn hooks(&self) -> Arc<dyn MatchLifecycleHooks> {
        self.trigger.clone()
    }

    pub fn start(&self) -> StandingsResult<()> {
        self.queue.start()?;
        info!(triggers_enabled = self.trigger.is_enabled(), "✅ Standings automation started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.queue.stop().await;
    }

    /// Entry point for raw platform hook callbacks
    pub fn handle_hook_event(
        &self,
        event_type: &str,
        record: Value,
        previous: Option<Value>,
    ) -> ApiResponse<Vec<Uuid>> {
        let result = HookEvent::from_json(event_type, record, previous)
            .map(|event| dispatch_hook(self.trigger.as_ref(), &event));
        respond("handle_hook_event", result)
    }

    pub fn enqueue_recalculation(
        &self,
        league_id: i64,
        season_id: i64,
        priority: Option<JobPriority>,
        description: Option<String>,
    ) -> ApiResponse<Uuid> {
        let key = LeagueSeasonKey::new(league_id, season_id);
        respond(
            "enqueue_recalculation",
            self.trigger.trigger_manual(key, priority, description),
        )
    }

    pub fn queue_status(&self) -> ApiResponse<QueueStatus> {
        ApiResponse::ok(self.queue.status())
    }

    pub fn pause(&self) -> ApiResponse<QueueStatus> {
        self.queue.pause();
        self.queue_status()
    }

    pub fn resume(&self) -> ApiResponse<QueueStatus> {
        self.queue.resume();
        self.queue_status()
    }

    pub fn job(&self, job_id: Uuid) -> ApiResponse<CalculationJob> {
        respond(
            "job",
            self.queue
                .job(job_id)
                .ok_or_else(|| StandingsError::not_found("job", job_id)),
        )
    }

    pub fn job_history(&self, league_id: Option<i64>, limit: usize) -> ApiResponse<Vec<CalculationJob>> {
        ApiResponse::ok(self.queue.history(league_id, limit))
    }

    pub fn dead_letters(&self) -> ApiResponse<Vec<CalculationJob>> {
        ApiResponse::ok(self.queue.dead_letters())
    }

    pub fn retry_dead_letter(&self, job_id: Uuid) -> ApiResponse<Uuid> {
        respond(
            "retry_dead_letter",
            self.queue.retry_dead_letter(job_id).map(|()| job_id),
        )
    }

    pub fn set_triggers_enabled(&self, enabled: bool) -> ApiResponse<bool> {
        self.trigger.set_enabled(enabled);
        info!(enabled, "🔀 Hook-driven recalculation toggled");
        ApiResponse::ok(self.trigger.is_enabled())
    }

    pub async fn create_snapshot(
        &self,
        league_id: i64,
        season_id: i64,
        description: Option<String>,
    ) -> ApiResponse<Uuid> {
        let key = LeagueSeasonKey::new(league_id, season_id);
        let result = match validate_table_key(&key) {
            Ok(()) => self.snapshots.create(key, description).await,
            Err(e) => Err(e),
        };
        respond("create_snapshot", result)
    }

    pub async fn list_snapshots(&self, league_id: i64, season_id: i64) -> ApiResponse<Vec<SnapshotSummary>> {
        let key = LeagueSeasonKey::new(league_id, season_id);
        let result = match validate_table_key(&key) {
            Ok(()) => self.snapshots.list(key).await,
            Err(e) => Err(e),
        };
        respond("list_snapshots", result)
    }

    pub async fn restore_snapshot(&self, snapshot_id: Uuid) -> ApiResponse<SnapshotSummary> {
        respond("restore_snapshot", self.snapshots.restore(snapshot_id).await)
    }

    pub async fn delete_snapshot(&self, snapshot_id: Uuid) -> ApiResponse<Uuid> {
        respond(
            "delete_snapshot",
            self.snapshots.delete(snapshot_id).await.map(|()| snapshot_id),
        )
    }

    /// Queue checks plus snapshot storage; always succeeds
    pub async fn health(&self) -> ApiResponse<HealthReport> {
        let storage = match self.snapshots.store().health_check().await {
            Ok(()) => ComponentCheck::new(components::SNAPSHOT_STORE, HealthStatus::Healthy, "reachable"),
            Err(e) => ComponentCheck::new(
                components::SNAPSHOT_STORE,
                HealthStatus::Degraded,
                e.to_string(),
            ),
        };
        ApiResponse::ok(self.queue.health().with_check(storage))
    }
}

fn respond<T>(operation: &str, result: StandingsResult<T>) -> ApiResponse<T> {
    if let Err(error) = &result {
        match error.kind() {
            ErrorKind::Validation | ErrorKind::NotFound => {
                warn!(operation, error = %error, "Administrative request rejected");
            }
            _ => log_error("admin", operation, &error.to_string(), None),
        }
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{League, Match, Season, Side};
    use crate::repository::InMemoryRepository;
    use std::time::Duration;

    fn key() -> LeagueSeasonKey {
        LeagueSeasonKey::new(1, 2025)
    }

    async fn automation() -> (Arc<InMemoryRepository>, StandingsAutomation) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_league(League::new(1, "Kreisliga", vec![Side::new(1, "A"), Side::new(2, "B")]));
        repo.insert_season(Season::new(2025, "2025/26"));
        let automation = StandingsAutomation::new(
            StandingsConfig::default(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
        )
        .await
        .unwrap();
        (repo, automation)
    }

    #[tokio::test]
    async fn test_invalid_enqueue_returns_validation_envelope() {
        let (_, automation) = automation().await;
        let response = automation.enqueue_recalculation(-1, 2025, None, None);
        assert!(!response.success);
        assert_eq!(response.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(automation.queue_status().data.unwrap().totals.enqueued, 0);
    }

    #[tokio::test]
    async fn test_hook_event_to_recomputed_table() {
        let (repo, automation) = automation().await;
        automation.start().unwrap();

        let record = Match::completed(1, key(), 1, 2, 3, 1);
        repo.upsert_match(record.clone());
        let response =
            automation.handle_hook_event("afterCreate", serde_json::to_value(&record).unwrap(), None);
        assert_eq!(response.data.unwrap().len(), 1);

        automation
            .queue()
            .wait_until_idle(Duration::from_secs(5))
            .await
            .unwrap();
        let rows = repo.entries(key());
        assert_eq!(rows[0].side_name, "A");
        assert_eq!(rows[0].points, 3);
        automation.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_snapshot_and_job_are_not_found() {
        let (_, automation) = automation().await;
        let restore = automation.restore_snapshot(Uuid::new_v4()).await;
        assert_eq!(restore.error_kind(), Some(ErrorKind::NotFound));
        assert_eq!(automation.job(Uuid::new_v4()).error_kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_health_includes_snapshot_store() {
        let (_, automation) = automation().await;
        automation.start().unwrap();
        let report = automation.health().await.data.unwrap();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.check(components::SNAPSHOT_STORE).is_some());
        automation.shutdown().await;
    }
}
