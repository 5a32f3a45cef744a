//! # Trigger Condition
//!
//! Decides whether a match change affects the standings. Pure logic over the
//! new record and, for updates, the previous one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{LeagueSeasonKey, Match};
use crate::validation::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEventKind {
    Created,
    Updated,
    Deleted,
}

/// A match change as seen by a lifecycle hook
#[derive(Debug, Clone, Copy)]
pub struct MatchChangeEvent<'a> {
    pub kind: MatchEventKind,
    pub record: &'a Match,
    pub previous: Option<&'a Match>,
}

impl<'a> MatchChangeEvent<'a> {
    pub fn created(record: &'a Match) -> Self {
        Self {
            kind: MatchEventKind::Created,
            record,
            previous: None,
        }
    }

    pub fn updated(record: &'a Match, previous: Option<&'a Match>) -> Self {
        Self {
            kind: MatchEventKind::Updated,
            record,
            previous,
        }
    }

    pub fn deleted(record: &'a Match) -> Self {
        Self {
            kind: MatchEventKind::Deleted,
            record,
            previous: None,
        }
    }
}

/// Fields whose change can move the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    Status,
    HomeGoals,
    AwayGoals,
    HomeSide,
    AwaySide,
    League,
    Season,
}

/// Relevant fields that differ between `previous` and `next`; relations compare by id
pub fn changed_fields(previous: &Match, next: &Match) -> BTreeSet<ChangedField> {
    let mut changed = BTreeSet::new();
    if previous.status != next.status {
        changed.insert(ChangedField::Status);
    }
    if previous.home_goals != next.home_goals {
        changed.insert(ChangedField::HomeGoals);
    }
    if previous.away_goals != next.away_goals {
        changed.insert(ChangedField::AwayGoals);
    }
    if previous.home_side_id != next.home_side_id {
        changed.insert(ChangedField::HomeSide);
    }
    if previous.away_side_id != next.away_side_id {
        changed.insert(ChangedField::AwaySide);
    }
    if previous.league_id != next.league_id {
        changed.insert(ChangedField::League);
    }
    if previous.season_id != next.season_id {
        changed.insert(ChangedField::Season);
    }
    changed
}

pub fn should_trigger(event: &MatchChangeEvent<'_>) -> bool {
    // Any validation failure suppresses triggering unconditionally
    if !validate(event.record).is_valid {
        return false;
    }

    match (event.kind, event.previous) {
        (MatchEventKind::Updated, Some(previous)) => {
            !changed_fields(previous, event.record).is_empty()
                && (event.record.is_completed_with_scores() || previous.is_completed())
        }
        _ => event.record.is_completed_with_scores(),
    }
}

/// Tables to recompute for `event`; empty when it does not trigger
///
/// A completed match moved to another league or season leaves a stale
/// contribution behind, so the previous key is included as well.
pub fn affected_keys(event: &MatchChangeEvent<'_>) -> Vec<LeagueSeasonKey> {
    if !should_trigger(event) {
        return Vec::new();
    }

    let mut keys = Vec::with_capacity(2);
    if let Some(key) = event.record.key() {
        keys.push(key);
    }
    if let Some(previous) = event.previous.filter(|p| p.is_completed()) {
        if let Some(previous_key) = previous.key() {
            if !keys.contains(&previous_key) {
                keys.push(previous_key);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::MatchStatus;

    fn key() -> LeagueSeasonKey {
        LeagueSeasonKey::new(1, 2025)
    }

    #[test]
    fn test_create_requires_completed_with_scores() {
        let scheduled = Match::scheduled(1, key(), 1, 2);
        assert!(!should_trigger(&MatchChangeEvent::created(&scheduled)));

        let completed = Match::completed(1, key(), 1, 2, 2, 0);
        assert!(should_trigger(&MatchChangeEvent::created(&completed)));
        assert!(should_trigger(&MatchChangeEvent::deleted(&completed)));
    }

    #[test]
    fn test_invalid_record_never_triggers() {
        let mut completed = Match::completed(1, key(), 1, 2, 2, 0);
        completed.away_side_id = Some(1);
        assert!(!should_trigger(&MatchChangeEvent::created(&completed)));

        let previous = Match::completed(1, key(), 1, 2, 1, 0);
        assert!(!should_trigger(&MatchChangeEvent::updated(&completed, Some(&previous))));
    }

    #[test]
    fn test_score_correction_triggers() {
        let previous = Match::completed(1, key(), 1, 2, 1, 0);
        let next = Match::completed(1, key(), 1, 2, 1, 1);
        let fields = changed_fields(&previous, &next);
        assert_eq!(fields.into_iter().collect::<Vec<_>>(), vec![ChangedField::AwayGoals]);
        assert!(should_trigger(&MatchChangeEvent::updated(&next, Some(&previous))));
    }

    #[test]
    fn test_irrelevant_update_does_not_trigger() {
        let previous = Match::completed(1, key(), 1, 2, 1, 0);
        let mut next = previous.clone();
        next.notes = Some("attendance 312".to_string());
        next.matchday = Some(5);
        assert!(!should_trigger(&MatchChangeEvent::updated(&next, Some(&previous))));
    }

    #[test]
    fn test_uncompleting_a_match_triggers() {
        let previous = Match::completed(1, key(), 1, 2, 1, 0);
        let mut next = previous.clone().with_status(MatchStatus::Postponed);
        next.home_goals = None;
        next.away_goals = None;
        assert!(should_trigger(&MatchChangeEvent::updated(&next, Some(&previous))));
    }

    #[test]
    fn test_scheduled_edits_do_not_trigger() {
        let previous = Match::scheduled(1, key(), 1, 2);
        let next = previous.clone().with_status(MatchStatus::Postponed);
        assert!(!should_trigger(&MatchChangeEvent::updated(&next, Some(&previous))));
    }

    #[test]
    fn test_update_without_previous_behaves_like_create() {
        let completed = Match::completed(1, key(), 1, 2, 2, 0);
        assert!(should_trigger(&MatchChangeEvent::updated(&completed, None)));
        let scheduled = Match::scheduled(1, key(), 1, 2);
        assert!(!should_trigger(&MatchChangeEvent::updated(&scheduled, None)));
    }

    #[test]
    fn test_league_move_affects_both_tables() {
        let previous = Match::completed(1, key(), 1, 2, 3, 1);
        let mut next = previous.clone();
        next.league_id = Some(9);
        let event = MatchChangeEvent::updated(&next, Some(&previous));
        assert_eq!(
            affected_keys(&event),
            vec![LeagueSeasonKey::new(9, 2025), key()]
        );
    }
}
