//! Service layer for the savings ledger
//!
//! Services put validation, per-entity locking, the commit gate, audit
//! logging and completion events on top of the storage layer. They all
//! borrow one `LedgerContext`.

pub mod balance;
pub mod goal;
pub mod locks;
pub mod plan;
pub mod progress;
pub mod task;
pub mod transaction;
pub mod validator;

pub use balance::{BalanceDrift, BalanceOutcome, BalanceService};
pub use goal::{CreateGoalInput, GoalService};
pub use locks::{EntityGuard, EntityLocks, LockKey};
pub use plan::{CreatePlanInput, PlanService};
pub use progress::{GoalProgressReport, PlanPerformanceReport, ProgressService, ProgressStatus};
pub use task::TaskService;
pub use transaction::{CreateTransactionInput, TransactionService};

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::config::{LedgerPaths, Settings};
use crate::error::LedgerResult;
use crate::events::{EventSink, LedgerEvent, LogEventSink};
use crate::storage::Storage;

/// Source of "today" for validation and classification
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Self::System => Local::now().date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

/// Shared state every service works against
pub struct LedgerContext {
    pub storage: Storage,
    pub settings: Settings,
    locks: EntityLocks,
    events: Arc<dyn EventSink>,
    clock: Clock,
}

impl LedgerContext {
    pub fn new(storage: Storage, settings: Settings) -> Self {
        let locks = EntityLocks::new(settings.lock_timeout());
        Self {
            storage,
            settings,
            locks,
            events: Arc::new(LogEventSink),
            clock: Clock::System,
        }
    }

    /// Open storage under `paths`, loading settings and data
    pub fn open(paths: LedgerPaths) -> LedgerResult<Self> {
        let settings = Settings::load_or_create(&paths)?;
        let storage = Storage::open(paths)?;
        Ok(Self::new(storage, settings))
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    pub(crate) fn emit(&self, event: LedgerEvent) {
        self.events.emit(event);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::events::RecordingEventSink;
    use tempfile::TempDir;

    /// Context on a temp dir with a fixed clock and a recording sink
    pub fn context(today: NaiveDate) -> (TempDir, LedgerContext, RecordingEventSink) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let sink = RecordingEventSink::new();
        let settings = Settings {
            lock_timeout_ms: 10_000,
            ..Settings::default()
        };
        let ctx = LedgerContext::new(storage, settings)
            .with_clock(Clock::Fixed(today))
            .with_event_sink(Arc::new(sink.clone()));
        (temp_dir, ctx, sink)
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
