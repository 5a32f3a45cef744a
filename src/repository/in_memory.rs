//! # In-Memory Repository
//!
//! Complete implementation of the repository traits backed by process
//! memory, for embedding the engine without a platform store and for tests.
//! Read failures and read latency can be injected to exercise the retry and
//! timeout paths of the queue.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use super::{LeagueRepository, MatchRepository, TableEntryRepository};
use crate::error::{StandingsError, StandingsResult};
use crate::models::{League, LeagueSeasonKey, Match, Season, TableEntry};
use crate::state_machine::MatchStatus;

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    matches: RwLock<HashMap<i64, Match>>,
    leagues: RwLock<HashMap<i64, League>>,
    seasons: RwLock<HashMap<i64, Season>>,
    entries: RwLock<HashMap<LeagueSeasonKey, Vec<TableEntry>>>,
    failing_reads: AtomicU32,
    read_delay_ms: AtomicU64,
    replace_count: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_league(&self, league: League) {
        self.leagues.write().insert(league.id, league);
    }

    pub fn insert_season(&self, season: Season) {
        self.seasons.write().insert(season.id, season);
    }

    pub fn upsert_match(&self, record: Match) {
        self.matches.write().insert(record.id, record);
    }

    pub fn delete_match(&self, match_id: i64) -> Option<Match> {
        self.matches.write().remove(&match_id)
    }

    pub fn find_match(&self, match_id: i64) -> Option<Match> {
        self.matches.read().get(&match_id).cloned()
    }

    /// Current rows for `key` without going through the async trait
    pub fn entries(&self, key: LeagueSeasonKey) -> Vec<TableEntry> {
        self.entries.read().get(&key).cloned().unwrap_or_default()
    }

    /// Overwrite rows directly, simulating a manual edit on the platform side
    pub fn set_entries(&self, key: LeagueSeasonKey, entries: Vec<TableEntry>) {
        self.entries.write().insert(key, entries);
    }

    /// Make the next `count` match reads fail with a transient error
    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Delay every match read by `delay`
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of completed `replace_entries` calls
    pub fn replace_count(&self) -> u64 {
        self.replace_count.load(Ordering::SeqCst)
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl MatchRepository for InMemoryRepository {
    async fn find_matches(
        &self,
        key: LeagueSeasonKey,
        status: Option<MatchStatus>,
    ) -> StandingsResult<Vec<Match>> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.take_injected_failure() {
            return Err(StandingsError::transient(
                "find_matches",
                format!("injected read failure for {key}"),
            ));
        }

        let mut matches: Vec<Match> = self
            .matches
            .read()
            .values()
            .filter(|m| m.key() == Some(key))
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.id);
        Ok(matches)
    }
}

#[async_trait]
impl TableEntryRepository for InMemoryRepository {
    async fn find_entries(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<TableEntry>> {
        Ok(self.entries(key))
    }

    async fn replace_entries(
        &self,
        key: LeagueSeasonKey,
        entries: Vec<TableEntry>,
    ) -> StandingsResult<()> {
        self.entries.write().insert(key, entries);
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl LeagueRepository for InMemoryRepository {
    async fn find_league(&self, league_id: i64) -> StandingsResult<Option<League>> {
        Ok(self.leagues.read().get(&league_id).cloned())
    }

    async fn find_season(&self, season_id: i64) -> StandingsResult<Option<Season>> {
        Ok(self.seasons.read().get(&season_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_filter() {
        let repo = InMemoryRepository::new();
        let key = LeagueSeasonKey::new(1, 1);
        repo.upsert_match(Match::completed(1, key, 1, 2, 1, 0));
        repo.upsert_match(Match::scheduled(2, key, 2, 3));
        repo.upsert_match(Match::completed(3, LeagueSeasonKey::new(2, 1), 1, 2, 1, 0));

        let completed = repo
            .find_matches(key, Some(MatchStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(repo.find_matches(key, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let repo = InMemoryRepository::new();
        let key = LeagueSeasonKey::new(1, 1);
        repo.fail_next_reads(2);

        assert!(repo.find_matches(key, None).await.is_err());
        assert!(repo.find_matches(key, None).await.is_err());
        assert!(repo.find_matches(key, None).await.is_ok());
    }
}
