//! # Table Lock Registry
//!
//! Per-(league, season) exclusivity tokens. A key is held by at most one
//! holder at a time; holders are calculation job ids or the snapshot restore
//! path. All writers of table rows go through this registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::error::{StandingsError, StandingsResult};
use crate::models::LeagueSeasonKey;

const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLock {
    pub holder: Uuid,
    pub acquired_at: Instant,
}

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<LeagueSeasonKey, TableLock>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `key` if nobody holds it
    pub fn try_acquire(&self, key: LeagueSeasonKey, holder: Uuid) -> bool {
        match self.locks.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(TableLock {
                    holder,
                    acquired_at: Instant::now(),
                });
                true
            }
        }
    }

    /// Wait until the lock for `key` can be taken, up to `timeout`
    ///
    /// The lock is held until the returned guard is dropped.
    pub async fn acquire(
        &self,
        key: LeagueSeasonKey,
        holder: Uuid,
        timeout: Duration,
    ) -> StandingsResult<TableLockGuard<'_>> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_acquire(key, holder) {
                return Ok(TableLockGuard {
                    registry: self,
                    key,
                    holder,
                });
            }
            if Instant::now() >= deadline {
                return Err(StandingsError::timeout(
                    format!("acquire table lock for {key}"),
                    timeout,
                ));
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    /// Release the lock for `key` only if `holder` owns it
    pub fn release(&self, key: LeagueSeasonKey, holder: Uuid) -> bool {
        self.locks
            .remove_if(&key, |_, lock| lock.holder == holder)
            .is_some()
    }

    pub fn is_locked(&self, key: &LeagueSeasonKey) -> bool {
        self.locks.contains_key(key)
    }

    pub fn holder(&self, key: &LeagueSeasonKey) -> Option<Uuid> {
        self.locks.get(key).map(|lock| lock.holder)
    }

    pub fn held_count(&self) -> usize {
        self.locks.len()
    }

    /// Drop locks held longer than `ttl`, returning what was reaped
    pub fn reap_expired(&self, ttl: Duration) -> Vec<(LeagueSeasonKey, Uuid)> {
        let mut reaped = Vec::new();
        self.locks.retain(|key, lock| {
            let expired = lock.acquired_at.elapsed() > ttl;
            if expired {
                reaped.push((*key, lock.holder));
            }
            !expired
        });
        for (key, holder) in &reaped {
            warn!(key = %key, holder = %holder, ttl_ms = ttl.as_millis() as u64, "🔓 Reaped expired table lock");
        }
        reaped
    }
}

/// Releases its table lock when dropped, including when the owning future is cancelled
#[must_use = "the table lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TableLockGuard<'a> {
    registry: &'a LockRegistry,
    key: LeagueSeasonKey,
    holder: Uuid,
}

impl TableLockGuard<'_> {
    pub fn key(&self) -> LeagueSeasonKey {
        self.key
    }

    pub fn holder(&self) -> Uuid {
        self.holder
    }
}

impl Drop for TableLockGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(self.key, self.holder);
    }
}
