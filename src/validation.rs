//! Input validation and sanitization for match records
//!
//! `validate` reports every problem with a record without changing it;
//! `sanitize` coerces a partial payload into range instead of rejecting it.
//! Both are pure.

use serde::{Deserialize, Serialize};

use crate::constants::{
    codes, HIGH_SCORE_THRESHOLD, MATCHDAY_MAX, MATCHDAY_MIN, UNUSUAL_DIFFERENCE_THRESHOLD,
};
use crate::error::{FieldViolation, StandingsError, StandingsResult};
use crate::models::{LeagueSeasonKey, Match, MatchPatch};
use crate::state_machine::{is_valid_match_transition, MatchStatus};

/// Outcome of validating one record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
    pub warnings: Vec<FieldViolation>,
}

impl ValidationResult {
    fn from_issues(errors: Vec<FieldViolation>, warnings: Vec<FieldViolation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }

    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
        self
    }

    /// Convert into a `Validation` error when any error was reported
    pub fn into_result(self) -> StandingsResult<ValidationResult> {
        if self.is_valid {
            Ok(self)
        } else {
            let message = self
                .errors
                .iter()
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            Err(StandingsError::validation(message, self.errors))
        }
    }
}

/// Check one match record
pub fn validate(record: &Match) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let required = [
        ("league", record.league_id.is_some()),
        ("season", record.season_id.is_some()),
        ("home_side", record.home_side_id.is_some()),
        ("away_side", record.away_side_id.is_some()),
        ("kickoff", record.kickoff.is_some()),
    ];
    for (field, present) in required {
        if !present {
            errors.push(FieldViolation::new(
                field,
                codes::MISSING_REQUIRED_FIELD,
                format!("{field} is required"),
            ));
        }
    }

    if let (Some(home), Some(away)) = (record.home_side_id, record.away_side_id) {
        if home == away {
            errors.push(FieldViolation::new(
                "away_side",
                codes::TEAM_AGAINST_ITSELF,
                format!("side {home} cannot play against itself"),
            ));
        }
    }

    let home_goals = check_goals("home_goals", record.home_goals, &mut errors);
    let away_goals = check_goals("away_goals", record.away_goals, &mut errors);

    if let Some(matchday) = record.matchday {
        if !(MATCHDAY_MIN..=MATCHDAY_MAX).contains(&matchday) {
            errors.push(FieldViolation::new(
                "matchday",
                codes::INVALID_SPIELTAG_RANGE,
                format!("matchday {matchday} is outside {MATCHDAY_MIN}..={MATCHDAY_MAX}"),
            ));
        }
    }

    if record.status == MatchStatus::Completed && !record.has_both_goals() {
        errors.push(FieldViolation::new(
            "status",
            codes::SCORES_REQUIRED_FOR_COMPLETED,
            "a completed match needs both home and away goals",
        ));
    }

    for (field, goals) in [("home_goals", home_goals), ("away_goals", away_goals)] {
        if let Some(goals) = goals.filter(|g| *g > HIGH_SCORE_THRESHOLD) {
            warnings.push(FieldViolation::new(
                field,
                codes::HIGH_SCORE_VALUE,
                format!("{field} of {goals} is unusually high"),
            ));
        }
    }

    if let (Some(home), Some(away)) = (home_goals, away_goals) {
        let difference = home.abs_diff(away);
        if difference > UNUSUAL_DIFFERENCE_THRESHOLD {
            warnings.push(FieldViolation::new(
                "away_goals",
                codes::UNUSUAL_SCORE_DIFFERENCE,
                format!("goal difference of {difference} is unusual"),
            ));
        }
    }

    ValidationResult::from_issues(errors, warnings)
}

/// Report a goal value that is not a non-negative integer; returns the usable count
fn check_goals(field: &str, value: Option<f64>, errors: &mut Vec<FieldViolation>) -> Option<u32> {
    let value = value?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        errors.push(FieldViolation::new(
            field,
            codes::NEGATIVE_SCORE,
            format!("{field} must be a non-negative integer, got {value}"),
        ));
        None
    }
}

/// Check a status change against the match status state machine
pub fn validate_status_transition(from: MatchStatus, to: MatchStatus) -> ValidationResult {
    if is_valid_match_transition(from, to) {
        ValidationResult::from_issues(Vec::new(), Vec::new())
    } else {
        ValidationResult::from_issues(
            vec![FieldViolation::new(
                "status",
                codes::INVALID_STATUS_TRANSITION,
                format!("status cannot change from {from} to {to}"),
            )],
            Vec::new(),
        )
    }
}

/// Validate an edited record together with its status change
pub fn validate_update(previous: &Match, next: &Match) -> ValidationResult {
    validate(next).merge(validate_status_transition(previous.status, next.status))
}

/// Both ids of a table key must be positive
pub fn validate_table_key(key: &LeagueSeasonKey) -> StandingsResult<()> {
    let mut violations = Vec::new();
    if key.league_id <= 0 {
        violations.push(FieldViolation::new(
            "league_id",
            codes::INVALID_IDENTIFIER,
            format!("league id must be positive, got {}", key.league_id),
        ));
    }
    if key.season_id <= 0 {
        violations.push(FieldViolation::new(
            "season_id",
            codes::INVALID_IDENTIFIER,
            format!("season id must be positive, got {}", key.season_id),
        ));
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(StandingsError::validation(
            format!("invalid table key {key}"),
            violations,
        ))
    }
}

/// Coerce a partial payload into range instead of rejecting it
pub fn sanitize(patch: MatchPatch) -> MatchPatch {
    MatchPatch {
        home_goals: patch.home_goals.map(clamp_goals),
        away_goals: patch.away_goals.map(clamp_goals),
        matchday: patch
            .matchday
            .map(|m| m.clamp(i64::from(MATCHDAY_MIN), i64::from(MATCHDAY_MAX))),
        status: patch.status.map(|raw| {
            raw.trim()
                .to_ascii_lowercase()
                .parse::<MatchStatus>()
                .unwrap_or_default()
                .to_string()
        }),
        notes: patch.notes.and_then(trimmed),
        ..patch
    }
}

fn clamp_goals(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value.floor().min(f64::from(u32::MAX))
    }
}

fn trimmed(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
