use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::league::LeagueSeasonKey;
use super::table_entry::TableEntry;

/// Durable point-in-time copy of one table; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub key: LeagueSeasonKey,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub entries: Vec<TableEntry>,
    /// Serialized size of `entries` in bytes
    pub size_bytes: u64,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id,
            key: self.key,
            created_at: self.created_at,
            description: self.description.clone(),
            entry_count: self.entries.len(),
            size_bytes: self.size_bytes,
        }
    }
}

/// Snapshot metadata without the table rows, as returned by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub key: LeagueSeasonKey,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub entry_count: usize,
    pub size_bytes: u64,
}
