//! # Standings Configuration System
//!
//! Typed configuration for the automation engine. Every section has serde
//! defaults, so a config file only needs to name the values it overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use standings_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_file("config/standings.toml", "production")?;
//! let concurrency = manager.config().queue.concurrency;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Headroom a table lock must have over the longest permitted job attempt
pub const LOCK_TTL_MARGIN_MS: u64 = 1_000;

/// Root configuration structure mirroring `config/standings.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StandingsConfig {
    /// Job queue and worker pool settings
    pub queue: QueueConfig,

    /// Retry backoff settings
    pub backoff: BackoffConfig,

    /// Hook-driven trigger settings
    pub triggers: TriggerConfig,

    /// Snapshot storage and retention
    pub snapshots: SnapshotConfig,

    /// Health evaluation thresholds
    pub health: HealthConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of jobs processing in parallel
    pub concurrency: usize,
    /// Wall-clock budget for one calculation attempt
    pub job_timeout_ms: u64,
    /// Retries after the first attempt before a job is dead-lettered
    pub max_retries: u32,
    /// Finished jobs kept for history queries
    pub history_limit: usize,
    /// Dead-lettered jobs kept before the oldest are evicted
    pub dead_letter_limit: usize,
    /// Locks held longer than this are reaped by the dispatcher
    pub lock_ttl_ms: u64,
    /// Upper bound on how long the dispatcher sleeps without a notification
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            job_timeout_ms: 30_000,
            max_retries: 3,
            history_limit: 1000,
            dead_letter_limit: 500,
            lock_ttl_ms: 300_000,
            poll_interval_ms: 1000,
        }
    }
}

impl QueueConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_millis(self.lock_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter_enabled: bool,
    /// Maximum jitter as a fraction of the computed delay (0.0 to 1.0)
    pub max_jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
            jitter_enabled: true,
            max_jitter: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Global switch for hook-driven enqueuing; manual enqueues ignore it
    pub enabled: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory for the file-backed store; `None` keeps snapshots in memory
    pub storage_dir: Option<PathBuf>,
    pub max_per_table: usize,
    pub max_age_days: Option<u32>,
    /// How long a restore waits for a running recalculation to release its lock
    pub lock_wait_timeout_ms: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            max_per_table: 20,
            max_age_days: None,
            lock_wait_timeout_ms: 30_000,
        }
    }
}

impl SnapshotConfig {
    pub fn lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Number of most recent finished attempts the failure rate is computed over
    pub failure_window: usize,
    pub degraded_failure_rate: f64,
    pub unhealthy_failure_rate: f64,
    /// Pending jobs above this mark the queue degraded
    pub backlog_warning: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_window: 50,
            degraded_failure_rate: 0.2,
            unhealthy_failure_rate: 0.5,
            backlog_warning: 100,
        }
    }
}

impl StandingsConfig {
    /// Validate cross-field constraints and value ranges
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.queue.concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.concurrency",
                0,
                "concurrency must be greater than 0",
            ));
        }

        if self.queue.job_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.job_timeout_ms",
                0,
                "job timeout must be greater than 0",
            ));
        }

        if self.queue.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.poll_interval_ms",
                0,
                "poll interval must be greater than 0",
            ));
        }

        // The lock is taken before the job's timeout clock starts.
        let min_lock_ttl = self.queue.job_timeout_ms.saturating_add(LOCK_TTL_MARGIN_MS);
        if self.queue.lock_ttl_ms < min_lock_ttl {
            return Err(ConfigurationError::validation_error(format!(
                "queue.lock_ttl_ms ({}) must exceed queue.job_timeout_ms ({}) by at least {}ms",
                self.queue.lock_ttl_ms, self.queue.job_timeout_ms, LOCK_TTL_MARGIN_MS
            )));
        }

        if self.backoff.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "backoff.multiplier",
                self.backoff.multiplier,
                "multiplier must be at least 1.0",
            ));
        }

        if self.backoff.max_delay_ms < self.backoff.base_delay_ms {
            return Err(ConfigurationError::validation_error(format!(
                "backoff.max_delay_ms ({}) must not be below backoff.base_delay_ms ({})",
                self.backoff.max_delay_ms, self.backoff.base_delay_ms
            )));
        }

        if !(0.0..=1.0).contains(&self.backoff.max_jitter) {
            return Err(ConfigurationError::invalid_value(
                "backoff.max_jitter",
                self.backoff.max_jitter,
                "jitter must be between 0.0 and 1.0",
            ));
        }

        if self.snapshots.max_per_table == 0 {
            return Err(ConfigurationError::invalid_value(
                "snapshots.max_per_table",
                0,
                "at least one snapshot per table must be retained",
            ));
        }

        for (field, rate) in [
            ("health.degraded_failure_rate", self.health.degraded_failure_rate),
            ("health.unhealthy_failure_rate", self.health.unhealthy_failure_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigurationError::invalid_value(
                    field,
                    rate,
                    "rate must be between 0.0 and 1.0",
                ));
            }
        }

        if self.health.degraded_failure_rate > self.health.unhealthy_failure_rate {
            return Err(ConfigurationError::validation_error(
                "health.degraded_failure_rate must not exceed health.unhealthy_failure_rate",
            ));
        }

        Ok(())
    }
}
