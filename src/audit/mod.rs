//! Audit logging for the savings ledger
//!
//! Records every create, update and delete of plans, goals, ledger entries
//! and tasks with before/after snapshots in an append-only JSONL file.
//!
//! - `AuditEntry`: one log line with timestamp, operation, entity and values.
//! - `AuditLogger`: appends entries and reads them back.
//! - `generate_diff`: field-level change summary for update entries.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
