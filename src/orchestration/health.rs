//! # Health Evaluation
//!
//! Turns queue counters into component checks and aggregates them into one
//! status. Evaluation never fails; problems show up as degraded or unhealthy
//! checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::HealthConfig;
use crate::constants::components;

/// Ordered from best to worst so the aggregate is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
}

impl ComponentCheck {
    pub fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<ComponentCheck>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn from_checks(checks: Vec<ComponentCheck>) -> Self {
        let status = checks
            .iter()
            .map(|check| check.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        Self {
            status,
            checks,
            checked_at: Utc::now(),
        }
    }

    pub fn check(&self, name: &str) -> Option<&ComponentCheck> {
        self.checks.iter().find(|check| check.name == name)
    }

    pub fn with_check(mut self, check: ComponentCheck) -> Self {
        self.checks.push(check);
        Self::from_checks(self.checks)
    }
}

/// Queue counters health is evaluated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueHealthInputs {
    pub running: bool,
    pub paused: bool,
    pub recent_attempts: usize,
    pub recent_failures: usize,
    pub dead_letter_count: usize,
    pub pending_count: usize,
}

pub fn evaluate_queue_health(inputs: &QueueHealthInputs, config: &HealthConfig) -> Vec<ComponentCheck> {
    let mut checks = Vec::with_capacity(4);

    checks.push(match (inputs.running, inputs.paused) {
        (false, _) => ComponentCheck::new(
            components::DISPATCHER,
            HealthStatus::Unhealthy,
            "dispatcher is not running",
        ),
        (true, true) => ComponentCheck::new(
            components::DISPATCHER,
            HealthStatus::Degraded,
            "queue is paused; pending jobs are not being processed",
        ),
        (true, false) => {
            ComponentCheck::new(components::DISPATCHER, HealthStatus::Healthy, "running")
        }
    });

    checks.push(if inputs.recent_attempts == 0 {
        ComponentCheck::new(
            components::FAILURE_RATE,
            HealthStatus::Healthy,
            "no recent attempts",
        )
    } else {
        let rate = inputs.recent_failures as f64 / inputs.recent_attempts as f64;
        let status = if rate >= config.unhealthy_failure_rate {
            HealthStatus::Unhealthy
        } else if rate >= config.degraded_failure_rate {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ComponentCheck::new(
            components::FAILURE_RATE,
            status,
            format!(
                "{} of the last {} attempts failed ({:.0}%)",
                inputs.recent_failures,
                inputs.recent_attempts,
                rate * 100.0
            ),
        )
    });

    checks.push(if inputs.dead_letter_count > 0 {
        ComponentCheck::new(
            components::DEAD_LETTER,
            HealthStatus::Degraded,
            format!("{} jobs parked in dead-letter", inputs.dead_letter_count),
        )
    } else {
        ComponentCheck::new(components::DEAD_LETTER, HealthStatus::Healthy, "empty")
    });

    checks.push(if inputs.pending_count > config.backlog_warning {
        ComponentCheck::new(
            components::BACKLOG,
            HealthStatus::Degraded,
            format!(
                "{} jobs pending (warning above {})",
                inputs.pending_count, config.backlog_warning
            ),
        )
    } else {
        ComponentCheck::new(
            components::BACKLOG,
            HealthStatus::Healthy,
            format!("{} jobs pending", inputs.pending_count),
        )
    });

    checks
}
