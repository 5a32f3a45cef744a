#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Standings Core
//!
//! League table automation engine for amateur football platforms.
//!
//! ## Overview
//!
//! The collaborating platform owns matches, leagues, seasons and the stored
//! table rows. This crate listens to match lifecycle hooks, decides whether a
//! change affects the standings, and recomputes the affected league/season
//! tables asynchronously on a bounded worker pool. Snapshots protect and
//! recover table state.
//!
//! ## Flow
//!
//! A hook fires → [`orchestration::LifecycleTrigger`] validates the record and
//! asks the trigger condition whether it matters → a calculation job is queued
//! → [`orchestration::QueueManager`] takes the table lock, runs the
//! [`orchestration::TableCalculator`] which replaces all rows in one write →
//! the lock is released. Failures retry with backoff, then land in the
//! dead-letter list.
//!
//! ## Module Organization
//!
//! - [`admin`] - Administrative facade returning uniform responses
//! - [`config`] - Layered configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`hooks`] - Platform hook event boundary
//! - [`models`] - Domain records
//! - [`orchestration`] - Triggering, queueing and table calculation
//! - [`repository`] - Platform storage traits and an in-memory implementation
//! - [`services`] - Snapshot service and storage
//! - [`state_machine`] - Match and job status machines
//! - [`validation`] - Match validation and sanitization
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use standings_core::admin::StandingsAutomation;
//! use standings_core::config::StandingsConfig;
//! use standings_core::models::{League, LeagueSeasonKey, Match, Season, Side};
//! use standings_core::repository::InMemoryRepository;
//!
//! # tokio_test::block_on(async {
//! let repo = Arc::new(InMemoryRepository::new());
//! repo.insert_league(League::new(1, "Bezirksliga", vec![Side::new(1, "A"), Side::new(2, "B")]));
//! repo.insert_season(Season::new(2025, "2025/26"));
//! let key = LeagueSeasonKey::new(1, 2025);
//! repo.upsert_match(Match::completed(1, key, 1, 2, 2, 0));
//!
//! let automation =
//!     StandingsAutomation::new(StandingsConfig::default(), repo.clone(), repo.clone(), repo.clone())
//!         .await
//!         .unwrap();
//! automation.start().unwrap();
//!
//! let response = automation.enqueue_recalculation(1, 2025, None, Some("manual rebuild".into()));
//! assert!(response.success);
//!
//! automation.queue().wait_until_idle(Duration::from_secs(5)).await.unwrap();
//! assert_eq!(repo.entries(key)[0].side_name, "A");
//! automation.shutdown().await;
//! # });
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod admin;
pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod repository;
pub mod services;
pub mod state_machine;
pub mod validation;

pub use admin::{ApiError, ApiResponse, StandingsAutomation};
pub use config::{ConfigManager, ConfigurationError, StandingsConfig};
pub use error::{ErrorKind, FieldViolation, StandingsError, StandingsResult};
pub use models::{
    CalculationJob, JobPriority, League, LeagueSeasonKey, Match, MatchPatch, Season, Side,
    Snapshot, SnapshotSummary, TableEntry, TriggerReason,
};
pub use orchestration::{
    HealthReport, HealthStatus, LifecycleTrigger, MatchLifecycleHooks, QueueManager, QueueStatus,
    TableCalculator,
};
pub use state_machine::{JobStatus, MatchStatus};
pub use validation::{sanitize, validate, ValidationResult};
