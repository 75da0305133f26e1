//! Per-entity write locks
//!
//! Every mutation of a plan, goal or task runs while holding that entity's
//! lock, so a read-modify-write of one aggregate never interleaves with
//! another. Waiting is bounded; a writer that cannot get the lock in time
//! fails with `ConcurrencyConflict` and leaves nothing behind.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{GoalId, PlanId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    Plan(PlanId),
    Goal(GoalId),
    Task(TaskId),
}

impl LockKey {
    fn entity_type(&self) -> &'static str {
        match self {
            Self::Plan(_) => "Plan",
            Self::Goal(_) => "Goal",
            Self::Task(_) => "Task",
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan(id) => write!(f, "{}", id),
            Self::Goal(id) => write!(f, "{}", id),
            Self::Task(id) => write!(f, "{}", id),
        }
    }
}

/// Registry of held entity locks
pub struct EntityLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
    timeout: Duration,
}

impl EntityLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Take the lock for `key`, waiting at most the configured timeout
    pub fn acquire(&self, key: LockKey) -> LedgerResult<EntityGuard<'_>> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self
            .held
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Lock registry poisoned: {}", e)))?;

        while held.contains(&key) {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(entity = key.entity_type(), id = %key, "lock wait timed out");
                return Err(LedgerError::ConcurrencyConflict {
                    entity_type: key.entity_type(),
                    identifier: key.to_string(),
                });
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|e| LedgerError::Storage(format!("Lock registry poisoned: {}", e)))?;
            held = guard;
        }

        held.insert(key);
        Ok(EntityGuard { locks: self, key })
    }

    pub fn is_held(&self, key: LockKey) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&key))
            .unwrap_or(false)
    }
}

/// Releases the entity lock on drop
pub struct EntityGuard<'a> {
    locks: &'a EntityLocks,
    key: LockKey,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        // A poisoned registry still holds valid data; release regardless.
        let mut held = match self.locks.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}
