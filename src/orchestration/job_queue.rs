//! # Pending Job Queue
//!
//! Ordered pending set drained by the dispatcher: priority tier first (HIGH
//! before NORMAL before LOW), enqueue sequence within a tier. Entries waiting
//! for a retry delay stay in place but are skipped until `not_before`.
//!
//! Not synchronized; the queue manager guards it with its state mutex.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::{JobPriority, LeagueSeasonKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueOrder {
    priority: Reverse<JobPriority>,
    sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingJob {
    pub job_id: Uuid,
    pub key: LeagueSeasonKey,
    pub priority: JobPriority,
    pub sequence: u64,
    pub not_before: Option<Instant>,
}

impl PendingJob {
    fn is_ready(&self, now: Instant) -> bool {
        self.not_before.map_or(true, |at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct JobQueue {
    entries: BTreeMap<QueueOrder, PendingJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: PendingJob) {
        let order = QueueOrder {
            priority: Reverse(job.priority),
            sequence: job.sequence,
        };
        self.entries.insert(order, job);
    }

    /// Remove and return the first ready entry that `claim` accepts
    ///
    /// `claim` is consulted in dispatch order and typically takes the table
    /// lock; an entry whose key is busy is skipped and stays queued.
    pub fn pop_claimable<F>(&mut self, now: Instant, mut claim: F) -> Option<PendingJob>
    where
        F: FnMut(&PendingJob) -> bool,
    {
        let order = self
            .entries
            .iter()
            .find(|(_, job)| job.is_ready(now) && claim(*job))
            .map(|(order, _)| *order)?;
        self.entries.remove(&order)
    }

    /// Earliest retry time still in the future, if any
    pub fn next_ready_at(&self, now: Instant) -> Option<Instant> {
        self.entries
            .values()
            .filter_map(|job| job.not_before)
            .filter(|at| *at > now)
            .min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
