use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::league::LeagueSeasonKey;
use crate::state_machine::MatchStatus;

/// A fixture between two sides as stored by the platform
///
/// Goals are carried exactly as the platform delivered them, so a record may
/// hold negative or fractional values until it has been validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub kickoff: Option<DateTime<Utc>>,
    pub league_id: Option<i64>,
    pub season_id: Option<i64>,
    pub home_side_id: Option<i64>,
    pub away_side_id: Option<i64>,
    pub home_goals: Option<f64>,
    pub away_goals: Option<f64>,
    pub matchday: Option<i32>,
    #[serde(default)]
    pub status: MatchStatus,
    pub notes: Option<String>,
}

impl Match {
    /// A scheduled fixture with every required relation present
    pub fn scheduled(id: i64, key: LeagueSeasonKey, home_side_id: i64, away_side_id: i64) -> Self {
        Self {
            id,
            kickoff: Some(Utc::now()),
            league_id: Some(key.league_id),
            season_id: Some(key.season_id),
            home_side_id: Some(home_side_id),
            away_side_id: Some(away_side_id),
            home_goals: None,
            away_goals: None,
            matchday: Some(1),
            status: MatchStatus::Scheduled,
            notes: None,
        }
    }

    /// A completed fixture with the given result
    pub fn completed(
        id: i64,
        key: LeagueSeasonKey,
        home_side_id: i64,
        away_side_id: i64,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self::scheduled(id, key, home_side_id, away_side_id).with_result(home_goals, away_goals)
    }

    pub fn with_result(mut self, home_goals: u32, away_goals: u32) -> Self {
        self.home_goals = Some(f64::from(home_goals));
        self.away_goals = Some(f64::from(away_goals));
        self.status = MatchStatus::Completed;
        self
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_matchday(mut self, matchday: i32) -> Self {
        self.matchday = Some(matchday);
        self
    }

    pub fn key(&self) -> Option<LeagueSeasonKey> {
        Some(LeagueSeasonKey::new(self.league_id?, self.season_id?))
    }

    /// Both goals, if both are present non-negative integers
    pub fn score(&self) -> Option<(u32, u32)> {
        Some((as_goal_count(self.home_goals?)?, as_goal_count(self.away_goals?)?))
    }

    pub fn has_both_goals(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn is_completed_with_scores(&self) -> bool {
        self.is_completed() && self.has_both_goals()
    }
}

fn as_goal_count(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

/// Partial, loosely typed match payload as submitted by editors or imports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPatch {
    pub kickoff: Option<DateTime<Utc>>,
    pub league_id: Option<i64>,
    pub season_id: Option<i64>,
    pub home_side_id: Option<i64>,
    pub away_side_id: Option<i64>,
    pub home_goals: Option<f64>,
    pub away_goals: Option<f64>,
    pub matchday: Option<i64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl MatchPatch {
    /// Overlay the present fields onto `target`
    ///
    /// Matchday values outside `i32` and unrecognised statuses are skipped;
    /// run the patch through `validation::sanitize` first to normalise them.
    pub fn apply_to(&self, target: &mut Match) {
        if let Some(kickoff) = self.kickoff {
            target.kickoff = Some(kickoff);
        }
        if let Some(league_id) = self.league_id {
            target.league_id = Some(league_id);
        }
        if let Some(season_id) = self.season_id {
            target.season_id = Some(season_id);
        }
        if let Some(home) = self.home_side_id {
            target.home_side_id = Some(home);
        }
        if let Some(away) = self.away_side_id {
            target.away_side_id = Some(away);
        }
        if let Some(goals) = self.home_goals {
            target.home_goals = Some(goals);
        }
        if let Some(goals) = self.away_goals {
            target.away_goals = Some(goals);
        }
        if let Some(matchday) = self.matchday.and_then(|m| i32::try_from(m).ok()) {
            target.matchday = Some(matchday);
        }
        if let Some(status) = self.status.as_deref().and_then(|s| s.parse().ok()) {
            target.status = status;
        }
        if let Some(notes) = &self.notes {
            target.notes = Some(notes.clone());
        }
    }
}
