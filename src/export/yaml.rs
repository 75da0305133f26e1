//! YAML export of a plan ledger
//!
//! Same document as the JSON export, preceded by a comment header.

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};

use super::json::PlanExport;

pub fn write_plan_export_yaml<W: Write>(export: &PlanExport, writer: &mut W) -> LedgerResult<()> {
    let header = format!(
        "# Savings ledger export\n# Plan: {}\n# Generated: {}\n# App Version: {}\n\n",
        export.plan_name, export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| LedgerError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, export).map_err(|e| LedgerError::Export(e.to_string()))?;
    Ok(())
}
