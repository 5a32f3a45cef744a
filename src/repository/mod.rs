//! # Platform Repositories
//!
//! The collaborating platform owns matches, leagues, seasons and the stored
//! table rows. The engine reaches them only through these traits, so any
//! backing store the platform uses can be plugged in.

pub mod in_memory;

use async_trait::async_trait;

use crate::error::StandingsResult;
use crate::models::{League, LeagueSeasonKey, Match, Season, TableEntry};
use crate::state_machine::MatchStatus;

pub use in_memory::InMemoryRepository;

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Matches for one league/season, optionally filtered by status
    async fn find_matches(
        &self,
        key: LeagueSeasonKey,
        status: Option<MatchStatus>,
    ) -> StandingsResult<Vec<Match>>;
}

#[async_trait]
pub trait TableEntryRepository: Send + Sync {
    async fn find_entries(&self, key: LeagueSeasonKey) -> StandingsResult<Vec<TableEntry>>;

    /// Replace every row for `key` in one atomic write
    async fn replace_entries(
        &self,
        key: LeagueSeasonKey,
        entries: Vec<TableEntry>,
    ) -> StandingsResult<()>;
}

#[async_trait]
pub trait LeagueRepository: Send + Sync {
    async fn find_league(&self, league_id: i64) -> StandingsResult<Option<League>>;

    async fn find_season(&self, season_id: i64) -> StandingsResult<Option<Season>>;
}
