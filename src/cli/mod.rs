//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod export;
pub mod goal;
pub mod plan;
pub mod report;
pub mod task;
pub mod transaction;
pub mod verify;

pub use audit::{handle_audit_command, AuditArgs};
pub use export::{handle_export_command, ExportArgs};
pub use goal::{handle_goal_command, GoalCommands};
pub use plan::{handle_plan_command, PlanCommands};
pub use report::{handle_report_command, ReportArgs};
pub use task::{handle_task_command, TaskCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use verify::handle_verify_command;

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DateRange, Goal, Money, Plan};
use crate::services::{GoalService, LedgerContext, PlanService};

/// Parse an amount such as "200", "19.99" or "$5"
pub(crate) fn parse_money(input: &str) -> LedgerResult<Money> {
    Money::parse(input).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid amount '{}'. Use a format like '100' or '19.99' ({})",
            input, e
        ))
    })
}

/// Parse a YYYY-MM-DD date
pub(crate) fn parse_date(input: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        LedgerError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", input))
    })
}

pub(crate) fn parse_optional_date(input: Option<&str>) -> LedgerResult<Option<NaiveDate>> {
    input.map(parse_date).transpose()
}

/// Build a range from optional --from/--to flags
pub(crate) fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> LedgerResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let from = parse_optional_date(from)?;
    let to = parse_optional_date(to)?;
    if let (Some(start), Some(end)) = (from, to) {
        DateRange::new(start, end).map_err(|e| LedgerError::InvalidDate(e.to_string()))?;
    }
    Ok((from, to))
}

/// Look up a plan by name or ID, failing with NotFound
pub(crate) fn resolve_plan(ctx: &LedgerContext, identifier: &str) -> LedgerResult<Plan> {
    PlanService::new(ctx)
        .find(identifier)?
        .ok_or_else(|| LedgerError::plan_not_found(identifier))
}

/// Look up a goal by name or ID, failing with NotFound
pub(crate) fn resolve_goal(ctx: &LedgerContext, identifier: &str) -> LedgerResult<Goal> {
    GoalService::new(ctx)
        .find(identifier)?
        .ok_or_else(|| LedgerError::goal_not_found(identifier))
}
