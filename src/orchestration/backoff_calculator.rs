//! # Backoff Calculator
//!
//! Exponential backoff for calculation job retries.
//!
//! `delay = min(base * multiplier^(attempt - 1), max)`, then optionally moved
//! up or down by a random amount of at most `max_jitter * delay` so retries of
//! jobs that failed together do not all land at the same instant.

use rand::Rng;
use std::time::Duration;

use crate::config::BackoffConfig;

#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    config: BackoffConfig,
}

impl BackoffCalculator {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let base = self.config.base_delay_ms as f64;
        let max = self.config.max_delay_ms;
        let delay_ms = (base * self.config.multiplier.powi(exponent)).min(max as f64) as u64;

        let delay_ms = if self.config.jitter_enabled {
            self.apply_jitter(delay_ms).min(max)
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }

    fn apply_jitter(&self, delay_ms: u64) -> u64 {
        let jitter_range = (delay_ms as f64 * self.config.max_jitter) as u64;
        if jitter_range == 0 {
            return delay_ms;
        }

        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0..=jitter_range);

        if rng.gen_bool(0.5) {
            delay_ms.saturating_add(jitter)
        } else {
            delay_ms.saturating_sub(jitter)
        }
    }
}
