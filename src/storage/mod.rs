//! Storage layer for the savings ledger
//!
//! JSON file storage with atomic writes. `Storage` owns every repository,
//! the audit log, and the commit gate that lets reports read a consistent
//! snapshot while writers on different entities run in parallel.

pub mod file_io;
pub mod goals;
pub mod plans;
pub mod tasks;
pub mod transactions;

pub use file_io::{read_json, write_json_atomic};
pub use goals::GoalRepository;
pub use plans::PlanRepository;
pub use tasks::TaskRepository;
pub use transactions::{LedgerFilter, LedgerRepository, LedgerTotals};

use std::sync::{RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Goal, Plan, PlanId, Task, Transaction};

/// Guard held by a writer for the duration of one commit
pub type WriteGuard<'a> = RwLockReadGuard<'a, ()>;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerPaths,
    pub plans: PlanRepository,
    pub ledger: LedgerRepository,
    pub goals: GoalRepository,
    pub tasks: TaskRepository,
    audit: AuditLogger,
    /// Writers hold the shared side; `snapshot` takes it exclusively
    commit_gate: RwLock<()>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            plans: PlanRepository::new(paths.plans_file()),
            ledger: LedgerRepository::new(paths.ledger_file()),
            goals: GoalRepository::new(paths.goals_file()),
            tasks: TaskRepository::new(paths.tasks_file()),
            audit: AuditLogger::new(paths.audit_log()),
            commit_gate: RwLock::new(()),
            paths,
        })
    }

    /// Create and load in one step
    pub fn open(paths: LedgerPaths) -> LedgerResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> LedgerResult<()> {
        self.plans.load()?;
        self.ledger.load()?;
        self.goals.load()?;
        self.tasks.load()?;
        tracing::debug!(
            plans = self.plans.count()?,
            entries = self.ledger.count()?,
            goals = self.goals.count()?,
            tasks = self.tasks.count()?,
            "storage loaded"
        );
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> LedgerResult<()> {
        let _gate = self.begin_write()?;
        self.plans.save()?;
        self.ledger.save()?;
        self.goals.save()?;
        self.tasks.save()?;
        Ok(())
    }

    /// Enter the commit gate as a writer
    pub fn begin_write(&self) -> LedgerResult<WriteGuard<'_>> {
        self.commit_gate
            .read()
            .map_err(|e| LedgerError::Storage(format!("Commit gate poisoned: {}", e)))
    }

    /// Consistent copy of everything, taken while no commit is in flight
    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let _exclusive = self
            .commit_gate
            .write()
            .map_err(|e| LedgerError::Storage(format!("Commit gate poisoned: {}", e)))?;

        Ok(LedgerSnapshot {
            taken_at: Utc::now(),
            plans: self.plans.get_all()?,
            transactions: self.ledger.get_all()?,
            goals: self.goals.get_all()?,
            tasks: self.tasks.get_all()?,
        })
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.write_audit(AuditEntry::create(entity_type, entity_id, entity_name, entity));
    }

    /// Record an update in the audit log
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        self.write_audit(AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ));
    }

    /// Record a delete in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.write_audit(AuditEntry::delete(entity_type, entity_id, entity_name, entity));
    }

    // The data change is already durable when this runs, so a failed audit
    // write is reported but does not fail the request.
    fn write_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.log(&entry) {
            tracing::warn!(
                error = %e,
                operation = %entry.operation,
                entity = %entry.entity_type,
                id = %entry.entity_id,
                "audit log write failed"
            );
        }
    }
}

/// Point-in-time copy used by reports and exports
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub taken_at: DateTime<Utc>,
    pub plans: Vec<Plan>,
    /// Every ledger entry, in ledger order
    pub transactions: Vec<Transaction>,
    pub goals: Vec<Goal>,
    pub tasks: Vec<Task>,
}

impl LedgerSnapshot {
    /// A plan's entries in ledger order
    pub fn ledger_for(&self, plan_id: PlanId) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| t.plan_id == plan_id)
    }

    pub fn plan(&self, plan_id: PlanId) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }
}
