use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::league::LeagueSeasonKey;
use crate::error::{StandingsError, StandingsResult};
use crate::state_machine::JobStatus;

/// Dispatch priority; HIGH drains before NORMAL before LOW
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPriority {
    Low,
    Normal,
    High,
}

impl Default for JobPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Normal => write!(f, "NORMAL"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

impl std::str::FromStr for JobPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "NORMAL" => Ok(Self::Normal),
            "HIGH" => Ok(Self::High),
            _ => Err(format!("Invalid job priority: {s}")),
        }
    }
}

/// Why a recalculation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    MatchCreated,
    MatchUpdated,
    MatchDeleted,
    Manual,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchCreated => write!(f, "match_created"),
            Self::MatchUpdated => write!(f, "match_updated"),
            Self::MatchDeleted => write!(f, "match_deleted"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Scheduled work recomputing one league/season table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationJob {
    pub id: Uuid,
    pub key: LeagueSeasonKey,
    pub priority: JobPriority,
    pub reason: TriggerReason,
    pub description: Option<String>,
    pub status: JobStatus,
    /// Monotonic enqueue order, used for FIFO within a priority tier
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// Duration of the most recent attempt
    pub duration_ms: Option<u64>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub dead_lettered: bool,
}

impl CalculationJob {
    pub fn new(
        key: LeagueSeasonKey,
        priority: JobPriority,
        reason: TriggerReason,
        description: Option<String>,
        sequence: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            priority,
            reason,
            description,
            status: JobStatus::Pending,
            sequence,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            next_attempt_at: None,
            duration_ms: None,
            retry_count: 0,
            max_retries,
            last_error: None,
            dead_lettered: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn retries_remaining(&self) -> bool {
        self.retry_count < self.max_retries
    }

    fn transition(&mut self, to: JobStatus) -> StandingsResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(StandingsError::Internal(format!(
                "Invalid job transition for {}: {} -> {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    pub fn mark_processing(&mut self) -> StandingsResult<()> {
        self.transition(JobStatus::Processing)?;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
        self.next_attempt_at = None;
        Ok(())
    }

    pub fn mark_completed(&mut self, duration_ms: u64) -> StandingsResult<()> {
        self.transition(JobStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        self.duration_ms = Some(duration_ms);
        Ok(())
    }

    /// Record a failed attempt and put the job back in line for `next_attempt_at`
    pub fn schedule_retry(
        &mut self,
        error: &StandingsError,
        duration_ms: u64,
        next_attempt_at: DateTime<Utc>,
    ) -> StandingsResult<()> {
        self.transition(JobStatus::Pending)?;
        self.retry_count += 1;
        self.duration_ms = Some(duration_ms);
        self.last_error = Some(error.to_string());
        self.next_attempt_at = Some(next_attempt_at);
        Ok(())
    }

    /// Terminal failure; the job is parked in the dead-letter list
    pub fn mark_failed(&mut self, error: &StandingsError, duration_ms: u64) -> StandingsResult<()> {
        self.transition(JobStatus::Failed)?;
        self.completed_at = Some(Utc::now());
        self.duration_ms = Some(duration_ms);
        self.last_error = Some(error.to_string());
        self.dead_lettered = true;
        Ok(())
    }

    /// Administrative retry of a dead-lettered job with a fresh retry budget
    pub fn requeue_from_dead_letter(&mut self, sequence: u64) -> StandingsResult<()> {
        self.transition(JobStatus::Pending)?;
        self.sequence = sequence;
        self.retry_count = 0;
        self.dead_lettered = false;
        self.completed_at = None;
        self.next_attempt_at = None;
        Ok(())
    }
}
