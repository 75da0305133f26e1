//! JSON export of a plan ledger with schema versioning

use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Plan, PlanId, Transaction};
use crate::storage::LedgerTotals;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Exported plan document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub plan_id: PlanId,
    pub plan_name: String,
    pub target_amount: Money,
    pub current_amount: Money,

    /// Totals over the exported entries only
    pub totals: LedgerTotals,

    pub earliest_transaction: Option<NaiveDate>,
    pub latest_transaction: Option<NaiveDate>,

    pub transactions: Vec<Transaction>,
}

impl PlanExport {
    pub fn new(plan: &Plan, transactions: Vec<Transaction>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            target_amount: plan.target_amount,
            current_amount: plan.current_amount,
            totals: LedgerTotals::from_entries(&transactions),
            earliest_transaction: transactions.first().map(|t| t.transaction_date),
            latest_transaction: transactions.last().map(|t| t.transaction_date),
            transactions,
        }
    }
}

/// Write the export as pretty-printed JSON
pub fn write_plan_export_json<W: Write>(export: &PlanExport, writer: &mut W) -> LedgerResult<()> {
    serde_json::to_writer_pretty(&mut *writer, export)
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| LedgerError::Export(e.to_string()))?;
    Ok(())
}
