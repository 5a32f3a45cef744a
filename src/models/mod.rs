//! # Domain Models
//!
//! Records exchanged with the collaborating platform (matches, leagues,
//! seasons, table entries) and the records owned by the automation engine
//! (calculation jobs, snapshots).

pub mod calculation_job;
pub mod league;
pub mod match_record;
pub mod snapshot;
pub mod table_entry;

pub use calculation_job::{CalculationJob, JobPriority, TriggerReason};
pub use league::{League, LeagueSeasonKey, Season, Side};
pub use match_record::{Match, MatchPatch};
pub use snapshot::{Snapshot, SnapshotSummary};
pub use table_entry::TableEntry;
