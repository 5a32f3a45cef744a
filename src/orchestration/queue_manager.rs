//! # Calculation Queue Manager
//!
//! Schedules standings recalculations and runs them on a bounded worker pool.
//!
//! ## Dispatch
//!
//! `enqueue` only records the job and wakes the dispatcher. The dispatcher task
//! takes a worker permit, claims the first ready job whose table lock is free
//! (priority tier, then enqueue order) and spawns a worker for it. Jobs for a
//! busy table stay pending until the running job releases the lock, so at most
//! one job per league/season is ever processing while distinct tables run in
//! parallel up to the concurrency limit.
//!
//! ## Failure handling
//!
//! Each attempt runs under the configured timeout. Retryable failures go back
//! in line after an exponential backoff delay; exhausted or non-retryable
//! failures are parked in the dead-letter list with their last error.

use chrono::Utc;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backoff_calculator::BackoffCalculator;
use super::health::{evaluate_queue_health, HealthReport, QueueHealthInputs};
use super::job_queue::{JobQueue, PendingJob};
use super::lock_registry::LockRegistry;
use super::table_calculator::{CalculationSummary, StandingsCalculator};
use crate::config::{BackoffConfig, HealthConfig, QueueConfig};
use crate::error::{StandingsError, StandingsResult};
use crate::logging::{log_error, log_job_operation};
use crate::models::{CalculationJob, JobPriority, LeagueSeasonKey, TriggerReason};
use crate::state_machine::JobStatus;
use crate::validation::validate_table_key;

/// Narrow scheduling seam used by the lifecycle trigger
pub trait JobScheduler: Send + Sync {
    fn schedule(
        &self,
        key: LeagueSeasonKey,
        priority: JobPriority,
        reason: TriggerReason,
        description: Option<String>,
    ) -> StandingsResult<Uuid>;
}

/// Lifetime counters since the queue was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTotals {
    pub enqueued: u64,
    pub attempts: u64,
    pub completed: u64,
    pub retried: u64,
    pub dead_lettered: u64,
    pub timed_out: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub running: bool,
    pub paused: bool,
    pub concurrency: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub dead_lettered: usize,
    pub held_locks: usize,
    pub totals: QueueTotals,
    pub average_duration_ms: f64,
    /// Completed jobs per minute since the dispatcher started
    pub throughput_per_minute: f64,
    /// Failed attempts over all attempts
    pub failure_rate: f64,
    pub current_jobs: Vec<CalculationJob>,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: HashMap<Uuid, CalculationJob>,
    queue: JobQueue,
    finished: VecDeque<Uuid>,
    dead_letter: VecDeque<Uuid>,
    next_sequence: u64,
    totals: QueueTotals,
    total_duration_ms: u64,
    /// Most recent attempt outcomes, `true` for a failure
    recent_outcomes: VecDeque<bool>,
}

impl QueueState {
    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn record_outcome(&mut self, failed: bool, window: usize) {
        self.totals.attempts += 1;
        self.recent_outcomes.push_back(failed);
        while self.recent_outcomes.len() > window {
            self.recent_outcomes.pop_front();
        }
    }

    fn count_status(&self, status: JobStatus) -> usize {
        self.jobs.values().filter(|job| job.status == status).count()
    }
}

struct QueueInner {
    config: QueueConfig,
    health_config: HealthConfig,
    backoff: BackoffCalculator,
    calculator: Arc<dyn StandingsCalculator>,
    locks: Arc<LockRegistry>,
    state: Mutex<QueueState>,
    notify: Notify,
    permits: Arc<Semaphore>,
    paused: AtomicBool,
    shutdown: AtomicBool,
    running: AtomicBool,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    started_at: Mutex<Option<Instant>>,
}

enum Outcome {
    Completed,
    Retry {
        delay: Duration,
        retry_count: u32,
        pending: PendingJob,
    },
    DeadLettered {
        retry_count: u32,
    },
}

enum Claim {
    Job { job_id: Uuid, key: LeagueSeasonKey },
    Idle { next_ready_at: Option<Instant> },
}

/// Handle to the calculation queue; clones share the same queue
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("concurrency", &self.inner.config.concurrency)
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

impl QueueManager {
    pub fn new(
        config: QueueConfig,
        backoff: BackoffConfig,
        health_config: HealthConfig,
        calculator: Arc<dyn StandingsCalculator>,
        locks: Arc<LockRegistry>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            inner: Arc::new(QueueInner {
                config,
                health_config,
                backoff: BackoffCalculator::new(backoff),
                calculator,
                locks,
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
                permits,
                paused: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                running: AtomicBool::new(false),
                dispatcher: Mutex::new(None),
                started_at: Mutex::new(None),
            }),
        }
    }

    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.inner.locks
    }

    /// Spawn the dispatcher on the current tokio runtime
    ///
    /// Calling `start` on a running queue is a no-op.
    pub fn start(&self) -> StandingsResult<()> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            StandingsError::Configuration(format!("queue must be started inside a tokio runtime: {e}"))
        })?;

        let mut dispatcher = self.inner.dispatcher.lock();
        if dispatcher.is_some() {
            debug!("Queue dispatcher already running");
            return Ok(());
        }

        self.inner.shutdown.store(false, Ordering::Release);
        self.inner.running.store(true, Ordering::Release);
        *self.inner.started_at.lock() = Some(Instant::now());
        let inner = Arc::clone(&self.inner);
        *dispatcher = Some(handle.spawn(run_dispatcher(inner)));

        info!(
            concurrency = self.inner.config.concurrency,
            job_timeout_ms = self.inner.config.job_timeout_ms,
            max_retries = self.inner.config.max_retries,
            "🚀 Calculation queue started"
        );
        Ok(())
    }

    /// Stop dispatching and wait for in-flight jobs to finish
    pub async fn stop(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.notify.notify_one();

        let handle = self.inner.dispatcher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log_error("queue_manager", "stop", &e.to_string(), Some("dispatcher task"));
            }
        }

        let concurrency = self.inner.config.concurrency.max(1) as u32;
        if let Ok(permits) = self.inner.permits.acquire_many(concurrency).await {
            drop(permits);
        }

        self.inner.running.store(false, Ordering::Release);
        info!("🛑 Calculation queue stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::Acquire)
    }

    /// Stop moving jobs into processing; running jobs are not cancelled
    pub fn pause(&self) {
        if !self.inner.paused.swap(true, Ordering::AcqRel) {
            info!("⏸️ Calculation queue paused");
        }
    }

    pub fn resume(&self) {
        if self.inner.paused.swap(false, Ordering::AcqRel) {
            info!("▶️ Calculation queue resumed");
        }
        self.inner.notify.notify_one();
    }

    /// Record a recalculation job for `key` and wake the dispatcher
    pub fn enqueue(
        &self,
        key: LeagueSeasonKey,
        priority: JobPriority,
        reason: TriggerReason,
        description: Option<String>,
    ) -> StandingsResult<Uuid> {
        validate_table_key(&key)?;

        let job_id = {
            let mut state = self.inner.state.lock();
            let sequence = state.next_sequence();
            let job = CalculationJob::new(
                key,
                priority,
                reason,
                description,
                sequence,
                self.inner.config.max_retries,
            );
            let job_id = job.id;
            state.queue.push(PendingJob {
                job_id,
                key,
                priority,
                sequence,
                not_before: None,
            });
            state.jobs.insert(job_id, job);
            state.totals.enqueued += 1;
            job_id
        };

        log_job_operation(
            "enqueue",
            Some(&job_id.to_string()),
            Some(key.league_id),
            Some(key.season_id),
            "pending",
            Some(&format!("priority={priority} reason={reason}")),
        );
        self.inner.notify.notify_one();
        Ok(job_id)
    }

    pub fn job(&self, job_id: Uuid) -> Option<CalculationJob> {
        self.inner.state.lock().jobs.get(&job_id).cloned()
    }

    /// Known jobs, newest first, optionally for one league
    pub fn history(&self, league_id: Option<i64>, limit: usize) -> Vec<CalculationJob> {
        let state = self.inner.state.lock();
        let mut jobs: Vec<CalculationJob> = state
            .jobs
            .values()
            .filter(|job| league_id.map_or(true, |id| job.key.league_id == id))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        jobs.truncate(limit);
        jobs
    }

    /// Dead-lettered jobs, oldest first
    pub fn dead_letters(&self) -> Vec<CalculationJob> {
        let state = self.inner.state.lock();
        state
            .dead_letter
            .iter()
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect()
    }

    /// Put a dead-lettered job back in line with a fresh retry budget
    pub fn retry_dead_letter(&self, job_id: Uuid) -> StandingsResult<()> {
        let key = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let position = state
                .dead_letter
                .iter()
                .position(|id| *id == job_id)
                .ok_or_else(|| StandingsError::not_found("dead_letter_job", job_id))?;

            state.next_sequence += 1;
            let sequence = state.next_sequence;
            let job = state
                .jobs
                .get_mut(&job_id)
                .ok_or_else(|| StandingsError::not_found("job", job_id))?;
            job.requeue_from_dead_letter(sequence)?;
            state.queue.push(PendingJob {
                job_id,
                key: job.key,
                priority: job.priority,
                sequence,
                not_before: None,
            });
            let key = job.key;
            state.dead_letter.remove(position);
            key
        };

        log_job_operation(
            "retry_dead_letter",
            Some(&job_id.to_string()),
            Some(key.league_id),
            Some(key.season_id),
            "pending",
            None,
        );
        self.inner.notify.notify_one();
        Ok(())
    }

    pub fn status(&self) -> QueueStatus {
        let started_at = *self.inner.started_at.lock();
        let state = self.inner.state.lock();
        let totals = state.totals;

        let average_duration_ms = if totals.completed == 0 {
            0.0
        } else {
            state.total_duration_ms as f64 / totals.completed as f64
        };
        let failure_rate = if totals.attempts == 0 {
            0.0
        } else {
            (totals.retried + totals.dead_lettered) as f64 / totals.attempts as f64
        };
        let throughput_per_minute = match started_at {
            Some(at) => {
                let minutes = at.elapsed().as_secs_f64() / 60.0;
                if minutes > 0.0 {
                    totals.completed as f64 / minutes
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let mut current_jobs: Vec<CalculationJob> = state
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Processing)
            .cloned()
            .collect();
        current_jobs.sort_by_key(|job| job.sequence);

        QueueStatus {
            running: self.is_running(),
            paused: self.is_paused(),
            concurrency: self.inner.config.concurrency,
            pending: state.queue.len(),
            processing: current_jobs.len(),
            completed: state.count_status(JobStatus::Completed),
            dead_lettered: state.dead_letter.len(),
            held_locks: self.inner.locks.held_count(),
            totals,
            average_duration_ms,
            throughput_per_minute,
            failure_rate,
            current_jobs,
        }
    }

    pub fn health(&self) -> HealthReport {
        let inputs = {
            let state = self.inner.state.lock();
            QueueHealthInputs {
                running: self.is_running(),
                paused: self.is_paused(),
                recent_attempts: state.recent_outcomes.len(),
                recent_failures: state.recent_outcomes.iter().filter(|f| **f).count(),
                dead_letter_count: state.dead_letter.len(),
                pending_count: state.queue.len(),
            }
        };
        HealthReport::from_checks(evaluate_queue_health(&inputs, &self.inner.health_config))
    }

    /// Wait until nothing is pending or processing
    pub async fn wait_until_idle(&self, timeout: Duration) -> StandingsResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let busy = {
                let state = self.inner.state.lock();
                !state.queue.is_empty() || state.count_status(JobStatus::Processing) > 0
            };
            if !busy {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StandingsError::timeout("wait for queue to drain", timeout));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl JobScheduler for QueueManager {
    fn schedule(
        &self,
        key: LeagueSeasonKey,
        priority: JobPriority,
        reason: TriggerReason,
        description: Option<String>,
    ) -> StandingsResult<Uuid> {
        self.enqueue(key, priority, reason, description)
    }
}

async fn run_dispatcher(inner: Arc<QueueInner>) {
    debug!("Queue dispatcher loop entered");
    loop {
        if inner.shutdown.load(Ordering::Acquire) {
            break;
        }
        if inner.paused.load(Ordering::Acquire) {
            inner.wait_for_work(None).await;
            continue;
        }

        let permit = match Arc::clone(&inner.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                inner.wait_for_work(None).await;
                continue;
            }
        };

        inner.locks.reap_expired(inner.config.lock_ttl());

        match inner.claim_next() {
            Claim::Job { job_id, key } => inner.spawn_worker(job_id, key, permit),
            Claim::Idle { next_ready_at } => {
                drop(permit);
                inner.wait_for_work(next_ready_at).await;
            }
        }
    }
    debug!("Queue dispatcher loop exited");
}

impl QueueInner {
    /// Sleep until notified, `until`, or the poll interval, whichever is first
    async fn wait_for_work(&self, until: Option<Instant>) {
        let poll = Instant::now() + self.config.poll_interval();
        let wake_at = until.map_or(poll, |at| at.min(poll));
        tokio::select! {
            _ = self.notify.notified() => {}
            _ = tokio::time::sleep_until(wake_at) => {}
        }
    }

    fn claim_next(&self) -> Claim {
        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let locks = &self.locks;

        let Some(pending) = state
            .queue
            .pop_claimable(now, |job| locks.try_acquire(job.key, job.job_id))
        else {
            return Claim::Idle {
                next_ready_at: state.queue.next_ready_at(now),
            };
        };

        match state.jobs.get_mut(&pending.job_id) {
            Some(job) => match job.mark_processing() {
                Ok(()) => {
                    debug!(job_id = %job.id, key = %job.key, attempt = job.retry_count + 1, "Job claimed");
                    Claim::Job {
                        job_id: pending.job_id,
                        key: pending.key,
                    }
                }
                Err(e) => {
                    locks.release(pending.key, pending.job_id);
                    log_error("queue_manager", "claim", &e.to_string(), None);
                    Claim::Idle { next_ready_at: None }
                }
            },
            None => {
                locks.release(pending.key, pending.job_id);
                warn!(job_id = %pending.job_id, "Queued job has no record; dropped");
                Claim::Idle { next_ready_at: None }
            }
        }
    }

    fn spawn_worker(self: &Arc<Self>, job_id: Uuid, key: LeagueSeasonKey, permit: OwnedSemaphorePermit) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            let timeout = inner.config.job_timeout();
            let attempt = AssertUnwindSafe(inner.calculator.calculate(key)).catch_unwind();

            let result = match tokio::time::timeout(timeout, attempt).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(StandingsError::Internal(format!(
                    "standings calculation for {key} panicked"
                ))),
                Err(_) => Err(StandingsError::timeout(
                    format!("calculate standings for {key}"),
                    timeout,
                )),
            };

            inner.finish_job(job_id, key, result, started.elapsed());
            drop(permit);
            inner.notify.notify_one();
        });
    }

    fn finish_job(
        &self,
        job_id: Uuid,
        key: LeagueSeasonKey,
        result: StandingsResult<CalculationSummary>,
        elapsed: Duration,
    ) {
        self.locks.release(key, job_id);
        let duration_ms = elapsed.as_millis() as u64;
        let window = self.health_config.failure_window.max(1);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(job) = state.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "Finished job has no record");
            return;
        };

        let outcome = match &result {
            Ok(_) => job.mark_completed(duration_ms).map(|()| Outcome::Completed),
            Err(error) if error.is_retryable() && job.retries_remaining() => {
                let delay = self.backoff.delay_for(job.retry_count + 1);
                let next_attempt_at = Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                job.schedule_retry(error, duration_ms, next_attempt_at)
                    .map(|()| Outcome::Retry {
                        delay,
                        retry_count: job.retry_count,
                        pending: PendingJob {
                            job_id,
                            key,
                            priority: job.priority,
                            sequence: job.sequence,
                            not_before: Some(Instant::now() + delay),
                        },
                    })
            }
            Err(error) => job
                .mark_failed(error, duration_ms)
                .map(|()| Outcome::DeadLettered {
                    retry_count: job.retry_count,
                }),
        };

        if let Err(StandingsError::ConcurrencyTimeout { .. }) = &result {
            state.totals.timed_out += 1;
        }

        match (outcome, result) {
            (Ok(Outcome::Completed), Ok(summary)) => {
                state.totals.completed += 1;
                state.total_duration_ms += duration_ms;
                state.record_outcome(false, window);
                state.finished.push_back(job_id);
                log_job_operation(
                    "complete",
                    Some(&job_id.to_string()),
                    Some(key.league_id),
                    Some(key.season_id),
                    "completed",
                    Some(&format!(
                        "entries={} matches={} duration_ms={duration_ms}",
                        summary.entries_written, summary.matches_counted
                    )),
                );
            }
            (Ok(Outcome::Retry { delay, retry_count, pending }), Err(error)) => {
                state.queue.push(pending);
                state.totals.retried += 1;
                state.record_outcome(true, window);
                warn!(
                    job_id = %job_id,
                    key = %key,
                    retry_count,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "🔄 Calculation failed, retry scheduled"
                );
            }
            (Ok(Outcome::DeadLettered { retry_count }), Err(error)) => {
                state.dead_letter.push_back(job_id);
                state.totals.dead_lettered += 1;
                state.record_outcome(true, window);
                log_error(
                    "queue_manager",
                    "calculate",
                    &error.to_string(),
                    Some(&format!(
                        "job {job_id} for {key} dead-lettered after {retry_count} retries"
                    )),
                );
            }
            (Ok(_), _) => {}
            (Err(e), _) => {
                log_error("queue_manager", "finish_job", &e.to_string(), Some(&job_id.to_string()));
            }
        }

        self.evict(state);
    }

    fn evict(&self, state: &mut QueueState) {
        while state.finished.len() > self.config.history_limit {
            if let Some(id) = state.finished.pop_front() {
                state.jobs.remove(&id);
            }
        }
        while state.dead_letter.len() > self.config.dead_letter_limit {
            if let Some(id) = state.dead_letter.pop_front() {
                let evicted = state.jobs.remove(&id);
                warn!(
                    job_id = %id,
                    key = ?evicted.map(|job| job.key.to_string()),
                    limit = self.config.dead_letter_limit,
                    "🗑️ Dead-letter list full, oldest entry evicted"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::codes;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct ScriptedCalculator {
        failures_left: AtomicU32,
        error: StandingsError,
        delay: Duration,
    }

    impl ScriptedCalculator {
        fn ok() -> Self {
            Self::failing(0, StandingsError::transient("read", "unused"))
        }

        fn failing(times: u32, error: StandingsError) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                error,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl StandingsCalculator for ScriptedCalculator {
        async fn calculate(&self, key: LeagueSeasonKey) -> StandingsResult<CalculationSummary> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let failing = self
                .failures_left
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(self.error.clone());
            }
            Ok(CalculationSummary {
                key,
                entries_written: 0,
                matches_counted: 0,
                duration_ms: 0,
            })
        }
    }

    fn queue_config() -> QueueConfig {
        QueueConfig {
            concurrency: 2,
            job_timeout_ms: 500,
            max_retries: 3,
            poll_interval_ms: 20,
            ..QueueConfig::default()
        }
    }

    fn fast_backoff() -> BackoffConfig {
        BackoffConfig {
            base_delay_ms: 5,
            max_delay_ms: 20,
            jitter_enabled: false,
            ..BackoffConfig::default()
        }
    }

    fn manager(config: QueueConfig, calculator: ScriptedCalculator) -> QueueManager {
        QueueManager::new(
            config,
            fast_backoff(),
            HealthConfig::default(),
            Arc::new(calculator),
            Arc::new(LockRegistry::new()),
        )
    }

    fn key() -> LeagueSeasonKey {
        LeagueSeasonKey::new(1, 2025)
    }

    #[test]
    fn test_enqueue_rejects_invalid_ids() {
        let queue = manager(queue_config(), ScriptedCalculator::ok());
        let err = queue
            .enqueue(LeagueSeasonKey::new(0, -1), JobPriority::Normal, TriggerReason::Manual, None)
            .unwrap_err();
        assert_eq!(err.violations().len(), 2);
        assert!(err
            .violations()
            .iter()
            .all(|v| v.code == codes::INVALID_IDENTIFIER));
        assert_eq!(queue.status().totals.enqueued, 0);
    }

    #[test]
    fn test_enqueue_without_dispatcher_stays_pending() {
        let queue = manager(queue_config(), ScriptedCalculator::ok());
        let id = queue
            .enqueue(key(), JobPriority::High, TriggerReason::Manual, Some("rebuild".into()))
            .unwrap();
        let job = queue.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.description.as_deref(), Some("rebuild"));

        let status = queue.status();
        assert_eq!(status.pending, 1);
        assert!(!status.running);
    }

    #[tokio::test]
    async fn test_job_completes() {
        let queue = manager(queue_config(), ScriptedCalculator::ok());
        queue.start().unwrap();
        let id = queue
            .enqueue(key(), JobPriority::Normal, TriggerReason::MatchUpdated, None)
            .unwrap();
        queue.wait_until_idle(Duration::from_secs(5)).await.unwrap();

        let job = queue.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.started_at.is_some());
        assert!(job.duration_ms.is_some());
        assert_eq!(queue.status().totals.completed, 1);
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let calculator = ScriptedCalculator::failing(2, StandingsError::transient("read", "reset"));
        let queue = manager(queue_config(), calculator);
        queue.start().unwrap();
        let id = queue
            .enqueue(key(), JobPriority::Normal, TriggerReason::Manual, None)
            .unwrap();
        queue.wait_until_idle(Duration::from_secs(5)).await.unwrap();

        let job = queue.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.retry_count, 2);
        assert_eq!(queue.status().totals.retried, 2);
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_non_retryable_failure_is_dead_lettered() {
        let calculator = ScriptedCalculator::failing(1, StandingsError::not_found("league", 1));
        let queue = manager(queue_config(), calculator);
        queue.start().unwrap();
        let id = queue
            .enqueue(key(), JobPriority::Normal, TriggerReason::Manual, None)
            .unwrap();
        queue.wait_until_idle(Duration::from_secs(5)).await.unwrap();

        let job = queue.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.last_error.as_deref(), Some("league not found: 1"));
        assert_eq!(queue.dead_letters().len(), 1);

        queue.retry_dead_letter(id).unwrap();
        queue.wait_until_idle(Duration::from_secs(5)).await.unwrap();
        assert_eq!(queue.job(id).unwrap().status, JobStatus::Completed);
        assert!(queue.dead_letters().is_empty());
        assert!(queue.retry_dead_letter(id).is_err());
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let config = QueueConfig {
            history_limit: 2,
            ..queue_config()
        };
        let queue = manager(config, ScriptedCalculator::ok());
        queue.start().unwrap();
        for _ in 0..4 {
            queue
                .enqueue(key(), JobPriority::Normal, TriggerReason::Manual, None)
                .unwrap();
        }
        queue.wait_until_idle(Duration::from_secs(5)).await.unwrap();

        assert_eq!(queue.history(None, 10).len(), 2);
        assert_eq!(queue.history(Some(99), 10).len(), 0);
        assert_eq!(queue.status().totals.completed, 4);
        queue.stop().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_reports_stopped() {
        let queue = manager(queue_config(), ScriptedCalculator::ok());
        queue.start().unwrap();
        queue.start().unwrap();
        assert!(queue.is_running());
        queue.stop().await;
        assert!(!queue.is_running());
        assert_eq!(
            queue.health().status,
            crate::orchestration::health::HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_start_requires_runtime() {
        let queue = manager(queue_config(), ScriptedCalculator::ok());
        assert!(matches!(
            queue.start(),
            Err(StandingsError::Configuration(_))
        ));
    }
}
