//! # System Constants
//!
//! Domain constants shared by validation, calculation and the job queue.

/// Lowest valid matchday
pub const MATCHDAY_MIN: i32 = 1;

/// Highest valid matchday (18-side double round robin)
pub const MATCHDAY_MAX: i32 = 34;

pub const POINTS_PER_WIN: u32 = 3;
pub const POINTS_PER_DRAW: u32 = 1;

/// Goal values above this produce a `HIGH_SCORE_VALUE` warning
pub const HIGH_SCORE_THRESHOLD: u32 = 10;

/// Absolute goal differences above this produce an `UNUSUAL_SCORE_DIFFERENCE` warning
pub const UNUSUAL_DIFFERENCE_THRESHOLD: u32 = 5;

/// Validation issue codes surfaced to the platform
pub mod codes {
    pub const TEAM_AGAINST_ITSELF: &str = "TEAM_AGAINST_ITSELF";
    pub const NEGATIVE_SCORE: &str = "NEGATIVE_SCORE";
    pub const INVALID_SPIELTAG_RANGE: &str = "INVALID_SPIELTAG_RANGE";
    pub const MISSING_REQUIRED_FIELD: &str = "MISSING_REQUIRED_FIELD";
    pub const SCORES_REQUIRED_FOR_COMPLETED: &str = "SCORES_REQUIRED_FOR_COMPLETED";
    pub const INVALID_STATUS_TRANSITION: &str = "INVALID_STATUS_TRANSITION";
    pub const HIGH_SCORE_VALUE: &str = "HIGH_SCORE_VALUE";
    pub const UNUSUAL_SCORE_DIFFERENCE: &str = "UNUSUAL_SCORE_DIFFERENCE";
    pub const INVALID_IDENTIFIER: &str = "INVALID_IDENTIFIER";
}

/// Health check component names
pub mod components {
    pub const DISPATCHER: &str = "queue_dispatcher";
    pub const FAILURE_RATE: &str = "job_failure_rate";
    pub const DEAD_LETTER: &str = "dead_letter";
    pub const BACKLOG: &str = "pending_backlog";
    pub const SNAPSHOT_STORE: &str = "snapshot_store";
}
