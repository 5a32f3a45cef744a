//! # Orchestration Engine
//!
//! Standings recalculation core: deciding when a match change matters,
//! queueing the work and running it under per-table exclusivity.
//!
//! ## Core Components
//!
//! - **TriggerCondition**: pure decision over a match change
//! - **LifecycleTrigger**: hook glue that turns accepted changes into jobs
//! - **QueueManager**: priority queue, bounded worker pool, retries and dead-letter
//! - **TableCalculator**: from-scratch recomputation of one league/season table
//! - **LockRegistry**: per-(league, season) exclusivity shared with snapshot restore
//! - **BackoffCalculator**: retry delay policy
//! - **Health**: component checks aggregated into healthy/degraded/unhealthy

pub mod backoff_calculator;
pub mod health;
pub mod job_queue;
pub mod lifecycle_trigger;
pub mod lock_registry;
pub mod queue_manager;
pub mod table_calculator;
pub mod trigger_condition;

pub use backoff_calculator::BackoffCalculator;
pub use health::{ComponentCheck, HealthReport, HealthStatus, QueueHealthInputs};
pub use job_queue::{JobQueue, PendingJob};
pub use lifecycle_trigger::{LifecycleTrigger, MatchLifecycleHooks};
pub use lock_registry::{LockRegistry, TableLock, TableLockGuard};
pub use queue_manager::{JobScheduler, QueueManager, QueueStatus, QueueTotals};
pub use table_calculator::{
    build_table, CalculationSummary, ComputedTable, StandingsCalculator, TableCalculator,
};
pub use trigger_condition::{
    affected_keys, changed_fields, should_trigger, ChangedField, MatchChangeEvent, MatchEventKind,
};
