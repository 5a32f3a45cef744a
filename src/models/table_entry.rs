use serde::{Deserialize, Serialize};

use super::league::{LeagueSeasonKey, Side};

/// One side's aggregated standing row for a league/season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub league_id: i64,
    pub season_id: i64,
    pub side_id: i64,
    pub side_name: String,
    pub side_logo: Option<String>,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u64,
    pub goals_against: u64,
    pub goal_difference: i64,
    pub points: u32,
    pub rank: u32,
}

impl TableEntry {
    /// An all-zero row for a side that has not played yet
    pub fn empty(key: LeagueSeasonKey, side: &Side) -> Self {
        Self {
            league_id: key.league_id,
            season_id: key.season_id,
            side_id: side.id,
            side_name: side.name.clone(),
            side_logo: side.logo.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
            rank: 0,
        }
    }

    pub fn key(&self) -> LeagueSeasonKey {
        LeagueSeasonKey::new(self.league_id, self.season_id)
    }

    /// played = W+D+L and goal difference = GF - GA
    pub fn is_consistent(&self) -> bool {
        self.played == self.wins + self.draws + self.losses
            && self.goal_difference == goal_difference(self.goals_for, self.goals_against)
    }
}

/// GF - GA, each side saturated at `i64::MAX` so the subtraction cannot overflow
pub fn goal_difference(goals_for: u64, goals_against: u64) -> i64 {
    let scored = i64::try_from(goals_for).unwrap_or(i64::MAX);
    let conceded = i64::try_from(goals_against).unwrap_or(i64::MAX);
    scored - conceded
}
