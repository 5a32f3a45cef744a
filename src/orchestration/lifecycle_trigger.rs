//! # Lifecycle Trigger
//!
//! Hook-side glue between match writes and the calculation queue. The hooks
//! run after the platform already committed the write, so nothing here may
//! fail the caller: scheduling errors are logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::queue_manager::JobScheduler;
use super::trigger_condition::{affected_keys, MatchChangeEvent, MatchEventKind};
use crate::error::StandingsResult;
use crate::logging::log_error;
use crate::models::{JobPriority, LeagueSeasonKey, Match, TriggerReason};
use crate::validation::validate;

/// The narrow interface the platform's match hooks are wired to
pub trait MatchLifecycleHooks: Send + Sync {
    fn after_create(&self, record: &Match) -> Vec<Uuid>;

    fn after_update(&self, record: &Match, previous: Option<&Match>) -> Vec<Uuid>;

    fn after_delete(&self, record: &Match) -> Vec<Uuid>;
}

pub struct LifecycleTrigger {
    scheduler: Arc<dyn JobScheduler>,
    enabled: AtomicBool,
}

impl std::fmt::Debug for LifecycleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleTrigger")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl LifecycleTrigger {
    pub fn new(scheduler: Arc<dyn JobScheduler>, enabled: bool) -> Self {
        Self {
            scheduler,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Toggle hook-driven enqueuing; manual triggers are unaffected
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        debug!(enabled, "Lifecycle trigger toggled");
    }

    /// Administrative recalculation request; defaults to HIGH priority
    pub fn trigger_manual(
        &self,
        key: LeagueSeasonKey,
        priority: Option<JobPriority>,
        description: Option<String>,
    ) -> StandingsResult<Uuid> {
        self.scheduler.schedule(
            key,
            priority.unwrap_or(JobPriority::High),
            TriggerReason::Manual,
            description,
        )
    }

    fn handle(&self, event: MatchChangeEvent<'_>) -> Vec<Uuid> {
        if !self.is_enabled() {
            debug!(match_id = event.record.id, "Lifecycle trigger disabled; change ignored");
            return Vec::new();
        }

        let validation = validate(event.record);
        if !validation.is_valid {
            debug!(
                match_id = event.record.id,
                errors = validation.errors.len(),
                "Match failed validation; no recalculation scheduled"
            );
            return Vec::new();
        }

        let (priority, reason) = match event.kind {
            MatchEventKind::Created => (JobPriority::Normal, TriggerReason::MatchCreated),
            MatchEventKind::Updated => (JobPriority::Normal, TriggerReason::MatchUpdated),
            MatchEventKind::Deleted => (JobPriority::High, TriggerReason::MatchDeleted),
        };

        affected_keys(&event)
            .into_iter()
            .filter_map(|key| {
                let description = format!("{reason} for match {}", event.record.id);
                match self.scheduler.schedule(key, priority, reason, Some(description)) {
                    Ok(job_id) => Some(job_id),
                    Err(e) => {
                        log_error(
                            "lifecycle_trigger",
                            "schedule",
                            &e.to_string(),
                            Some(&format!("match {} table {key}", event.record.id)),
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

impl MatchLifecycleHooks for LifecycleTrigger {
    fn after_create(&self, record: &Match) -> Vec<Uuid> {
        self.handle(MatchChangeEvent::created(record))
    }

    fn after_update(&self, record: &Match, previous: Option<&Match>) -> Vec<Uuid> {
        self.handle(MatchChangeEvent::updated(record, previous))
    }

    fn after_delete(&self, record: &Match) -> Vec<Uuid> {
        self.handle(MatchChangeEvent::deleted(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StandingsError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingScheduler {
        calls: Mutex<Vec<(LeagueSeasonKey, JobPriority, TriggerReason)>>,
        fail: AtomicBool,
    }

    impl JobScheduler for RecordingScheduler {
        fn schedule(
            &self,
            key: LeagueSeasonKey,
            priority: JobPriority,
            reason: TriggerReason,
            _description: Option<String>,
        ) -> StandingsResult<Uuid> {
            if self.fail.load(Ordering::Acquire) {
                return Err(StandingsError::Internal("queue unavailable".into()));
            }
            self.calls.lock().push((key, priority, reason));
            Ok(Uuid::new_v4())
        }
    }

    fn setup() -> (Arc<RecordingScheduler>, LifecycleTrigger) {
        let scheduler = Arc::new(RecordingScheduler::default());
        let trigger = LifecycleTrigger::new(scheduler.clone(), true);
        (scheduler, trigger)
    }

    fn key() -> LeagueSeasonKey {
        LeagueSeasonKey::new(3, 2025)
    }

    #[test]
    fn test_completed_create_enqueues_normal() {
        let (scheduler, trigger) = setup();
        let ids = trigger.after_create(&Match::completed(1, key(), 1, 2, 2, 0));
        assert_eq!(ids.len(), 1);
        assert_eq!(
            scheduler.calls.lock()[0],
            (key(), JobPriority::Normal, TriggerReason::MatchCreated)
        );
    }

    #[test]
    fn test_scheduled_create_is_ignored() {
        let (scheduler, trigger) = setup();
        assert!(trigger.after_create(&Match::scheduled(1, key(), 1, 2)).is_empty());
        assert!(scheduler.calls.lock().is_empty());
    }

    #[test]
    fn test_delete_enqueues_high() {
        let (scheduler, trigger) = setup();
        trigger.after_delete(&Match::completed(1, key(), 1, 2, 1, 1));
        assert_eq!(scheduler.calls.lock()[0].1, JobPriority::High);
    }

    #[test]
    fn test_disabled_blocks_hooks_not_manual() {
        let (scheduler, trigger) = setup();
        trigger.set_enabled(false);
        assert!(trigger
            .after_create(&Match::completed(1, key(), 1, 2, 2, 0))
            .is_empty());
        trigger.trigger_manual(key(), None, None).unwrap();

        let calls = scheduler.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (key(), JobPriority::High, TriggerReason::Manual));
    }

    #[test]
    fn test_scheduling_errors_are_swallowed() {
        let (scheduler, trigger) = setup();
        scheduler.fail.store(true, Ordering::Release);
        assert!(trigger
            .after_update(&Match::completed(1, key(), 1, 2, 3, 0), None)
            .is_empty());
        assert!(trigger.trigger_manual(key(), None, None).is_err());
    }

    #[test]
    fn test_invalid_update_never_triggers() {
        let (scheduler, trigger) = setup();
        let previous = Match::completed(1, key(), 1, 2, 1, 0);
        let mut next = previous.clone();
        next.away_side_id = Some(1);
        assert!(trigger.after_update(&next, Some(&previous)).is_empty());
        assert!(scheduler.calls.lock().is_empty());
    }
}
