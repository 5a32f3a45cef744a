//! # Table Calculation Engine
//!
//! Recomputes the complete standings for one league/season from the stored
//! matches and replaces the stored rows in one write. Every run starts from
//! scratch, so repeated runs without match changes produce identical rows and
//! a removed or corrected match can never leave a stale contribution behind.
//!
//! ## Ordering
//!
//! Points desc, goal difference desc, goals for desc, side name asc, side id asc.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::constants::{POINTS_PER_DRAW, POINTS_PER_WIN};
use crate::error::{StandingsError, StandingsResult};
use crate::models::table_entry::goal_difference;
use crate::models::{LeagueSeasonKey, Match, Side, TableEntry};
use crate::repository::{LeagueRepository, MatchRepository, TableEntryRepository};
use crate::state_machine::MatchStatus;

/// What a successful calculation wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub key: LeagueSeasonKey,
    pub entries_written: usize,
    pub matches_counted: usize,
    pub duration_ms: u64,
}

/// The unit of work executed by queue workers
#[async_trait]
pub trait StandingsCalculator: Send + Sync {
    async fn calculate(&self, key: LeagueSeasonKey) -> StandingsResult<CalculationSummary>;
}

/// Rows computed for one table plus the number of matches folded into them
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedTable {
    pub entries: Vec<TableEntry>,
    pub matches_counted: usize,
}

pub struct TableCalculator {
    matches: Arc<dyn MatchRepository>,
    entries: Arc<dyn TableEntryRepository>,
    leagues: Arc<dyn LeagueRepository>,
}

impl std::fmt::Debug for TableCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCalculator").finish_non_exhaustive()
    }
}

impl TableCalculator {
    pub fn new(
        matches: Arc<dyn MatchRepository>,
        entries: Arc<dyn TableEntryRepository>,
        leagues: Arc<dyn LeagueRepository>,
    ) -> Self {
        Self {
            matches,
            entries,
            leagues,
        }
    }

    /// Compute the table for `key` without persisting it
    pub async fn compute(&self, key: LeagueSeasonKey) -> StandingsResult<ComputedTable> {
        let league = self
            .leagues
            .find_league(key.league_id)
            .await?
            .ok_or_else(|| StandingsError::not_found("league", key.league_id))?;
        self.leagues
            .find_season(key.season_id)
            .await?
            .ok_or_else(|| StandingsError::not_found("season", key.season_id))?;

        let matches = self
            .matches
            .find_matches(key, Some(MatchStatus::Completed))
            .await?;

        debug!(
            key = %key,
            league = %league.name,
            completed_matches = matches.len(),
            registered_sides = league.sides.len(),
            "Computing standings"
        );

        build_table(key, &league.sides, &matches)
    }
}

#[async_trait]
impl StandingsCalculator for TableCalculator {
    async fn calculate(&self, key: LeagueSeasonKey) -> StandingsResult<CalculationSummary> {
        let started = Instant::now();
        let table = self.compute(key).await?;
        let entries_written = table.entries.len();

        self.entries.replace_entries(key, table.entries).await?;

        let summary = CalculationSummary {
            key,
            entries_written,
            matches_counted: table.matches_counted,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            key = %key,
            entries = summary.entries_written,
            matches = summary.matches_counted,
            duration_ms = summary.duration_ms,
            "📊 Standings recalculated"
        );
        Ok(summary)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    wins: u32,
    draws: u32,
    losses: u32,
    goals_for: u64,
    goals_against: u64,
}

impl Totals {
    fn record(&mut self, scored: u32, conceded: u32) {
        self.goals_for = self.goals_for.saturating_add(u64::from(scored));
        self.goals_against = self.goals_against.saturating_add(u64::from(conceded));
        match scored.cmp(&conceded) {
            Ordering::Greater => self.wins += 1,
            Ordering::Equal => self.draws += 1,
            Ordering::Less => self.losses += 1,
        }
    }
}

/// Fold completed matches into ranked rows
///
/// `registered` sides always get a row, all zero if they have not played.
/// Matches without a valid score or with identical sides are not counted.
pub fn build_table(
    key: LeagueSeasonKey,
    registered: &[Side],
    matches: &[Match],
) -> StandingsResult<ComputedTable> {
    let mut totals: BTreeMap<i64, Totals> = registered
        .iter()
        .map(|side| (side.id, Totals::default()))
        .collect();
    let mut matches_counted = 0usize;

    for record in matches {
        if !record.is_completed() || record.key() != Some(key) {
            continue;
        }
        let (Some(home), Some(away)) = (record.home_side_id, record.away_side_id) else {
            continue;
        };
        let Some((home_goals, away_goals)) = record.score() else {
            continue;
        };
        if home == away {
            continue;
        }

        totals.entry(home).or_default().record(home_goals, away_goals);
        totals.entry(away).or_default().record(away_goals, home_goals);
        matches_counted += 1;
    }

    let mut entries: Vec<TableEntry> = totals
        .into_iter()
        .map(|(side_id, t)| {
            let side = registered
                .iter()
                .find(|side| side.id == side_id)
                .cloned()
                .unwrap_or_else(|| Side::new(side_id, format!("Side {side_id}")));
            let mut entry = TableEntry::empty(key, &side);
            entry.wins = t.wins;
            entry.draws = t.draws;
            entry.losses = t.losses;
            entry.played = t.wins + t.draws + t.losses;
            entry.goals_for = t.goals_for;
            entry.goals_against = t.goals_against;
            entry.goal_difference = goal_difference(t.goals_for, t.goals_against);
            entry.points = t.wins * POINTS_PER_WIN + t.draws * POINTS_PER_DRAW;
            entry
        })
        .collect();

    entries.sort_by(compare_entries);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }

    let total_played: usize = entries.iter().map(|e| e.played as usize).sum();
    if total_played != 2 * matches_counted {
        error!(
            key = %key,
            total_played,
            matches_counted,
            "Standings invariant violated: played total does not match counted matches"
        );
        return Err(StandingsError::Internal(format!(
            "played total {total_played} != 2 x {matches_counted} matches for {key}"
        )));
    }

    Ok(ComputedTable {
        entries,
        matches_counted,
    })
}

fn compare_entries(a: &TableEntry, b: &TableEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.side_name.cmp(&b.side_name))
        .then_with(|| a.side_id.cmp(&b.side_id))
}
