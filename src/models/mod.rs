//! Core data models for the savings ledger
//!
//! This module contains the data structures of the savings domain: plans and
//! their ledger entries, goals, tasks, and report periods.

pub mod goal;
pub mod ids;
pub mod money;
pub mod period;
pub mod plan;
pub mod task;
pub mod transaction;

pub use goal::Goal;
pub use ids::{GoalId, PlanId, TaskId, TransactionId};
pub use money::Money;
pub use period::{DateRange, Granularity, ReportPeriod};
pub use plan::{Frequency, Plan};
pub use task::{Task, TaskState, TaskStatus};
pub use transaction::{Transaction, TransactionType};
