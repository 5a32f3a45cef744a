//! Shared setup for integration tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use standings_core::config::{BackoffConfig, HealthConfig, QueueConfig, StandingsConfig};
use standings_core::models::{League, LeagueSeasonKey, Season, Side};
use standings_core::orchestration::{CalculationSummary, LockRegistry, QueueManager, StandingsCalculator};
use standings_core::repository::InMemoryRepository;
use standings_core::StandingsResult;

pub const SEASON: i64 = 2025;

pub fn key(league_id: i64) -> LeagueSeasonKey {
    LeagueSeasonKey::new(league_id, SEASON)
}

/// Queue settings with short timings so tests run quickly
pub fn fast_config() -> StandingsConfig {
    StandingsConfig {
        queue: QueueConfig {
            concurrency: 3,
            job_timeout_ms: 2_000,
            poll_interval_ms: 20,
            ..QueueConfig::default()
        },
        backoff: BackoffConfig {
            base_delay_ms: 10,
            max_delay_ms: 50,
            jitter_enabled: false,
            ..BackoffConfig::default()
        },
        ..StandingsConfig::default()
    }
}

/// The Bezirksliga example: sides A, B and C in league 1
pub fn bezirksliga_repository() -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_league(League::new(
        1,
        "Bezirksliga",
        vec![Side::new(1, "A"), Side::new(2, "B"), Side::new(3, "C")],
    ));
    repo.insert_season(Season::new(SEASON, "2025/26"));
    repo
}

/// Calculator that records concurrency and sleeps to keep jobs overlapping
#[derive(Default)]
pub struct ProbeCalculator {
    pub delay: Duration,
    active: Mutex<HashSet<LeagueSeasonKey>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub same_key_overlaps: AtomicUsize,
    pub runs: AtomicUsize,
}

impl ProbeCalculator {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl StandingsCalculator for ProbeCalculator {
    async fn calculate(&self, key: LeagueSeasonKey) -> StandingsResult<CalculationSummary> {
        if !self.active.lock().insert(key) {
            self.same_key_overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.active.lock().remove(&key);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(CalculationSummary {
            key,
            entries_written: 0,
            matches_counted: 0,
            duration_ms: self.delay.as_millis() as u64,
        })
    }
}

pub fn queue_with(config: &StandingsConfig, calculator: Arc<dyn StandingsCalculator>) -> QueueManager {
    QueueManager::new(
        config.queue.clone(),
        config.backoff.clone(),
        HealthConfig::default(),
        calculator,
        Arc::new(LockRegistry::new()),
    )
}
