//! Export module for the savings ledger
//!
//! Selects one plan's ledger entries through a `LedgerFilter` and writes them
//! in one of three formats:
//! - CSV: one row per entry (spreadsheet-compatible)
//! - JSON: plan metadata, totals and entries
//! - YAML: the same document as JSON, with a comment header

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::write_transactions_csv;
pub use self::json::{write_plan_export_json, PlanExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::write_plan_export_yaml;

use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Plan, PlanId, Transaction};
use crate::storage::{LedgerFilter, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(LedgerError::Validation(format!(
                "Unknown export format '{}'. Expected csv, json or yaml",
                other
            ))),
        }
    }
}

/// The plan and its entries matching `filter`, in ledger order, read from
/// one snapshot so the exported balance matches the exported entries
pub fn select_transactions(
    storage: &Storage,
    plan_id: PlanId,
    filter: &LedgerFilter,
) -> LedgerResult<(Plan, Vec<Transaction>)> {
    let snapshot = storage.snapshot()?;
    let plan = snapshot
        .plan(plan_id)
        .cloned()
        .ok_or_else(|| LedgerError::plan_not_found(plan_id.to_string()))?;
    let transactions = filter.apply(snapshot.ledger_for(plan_id).cloned().collect());
    Ok((plan, transactions))
}

/// Export a plan's filtered ledger as bytes
pub fn export_transactions(
    storage: &Storage,
    plan_id: PlanId,
    format: ExportFormat,
    filter: &LedgerFilter,
) -> LedgerResult<Vec<u8>> {
    let (plan, transactions) = select_transactions(storage, plan_id, filter)?;
    let mut buffer = Vec::new();

    match format {
        ExportFormat::Csv => write_transactions_csv(&transactions, &mut buffer)?,
        ExportFormat::Json => {
            write_plan_export_json(&PlanExport::new(&plan, transactions), &mut buffer)?
        }
        ExportFormat::Yaml => {
            write_plan_export_yaml(&PlanExport::new(&plan, transactions), &mut buffer)?
        }
    }

    tracing::debug!(plan = %plan_id, %format, bytes = buffer.len(), "ledger exported");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::{DateRange, Frequency, Money, TransactionType};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn seeded() -> (TempDir, Storage, PlanId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let plan = Plan::new(
            "Emergency",
            Money::from_units(500),
            Money::from_units(50),
            Frequency::Weekly,
            date(1),
        );
        let plan_id = plan.id;
        storage.plans.commit(plan).unwrap();
        for (kind, units, day) in [
            (TransactionType::Saved, 50, 1),
            (TransactionType::Missed, 50, 8),
            (TransactionType::Saved, 50, 15),
            (TransactionType::Withdrawal, 20, 16),
        ] {
            storage
                .ledger
                .append(Transaction::new(plan_id, kind, Money::from_units(units), date(day)))
                .unwrap();
        }
        (temp_dir, storage, plan_id)
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_selection_honours_filter() {
        let (_temp, storage, plan_id) = seeded();

        let range = DateRange::new(date(2), date(31)).unwrap();
        let filter = LedgerFilter::new()
            .range(range)
            .types(vec![TransactionType::Saved, TransactionType::Withdrawal]);
        let (_, selected) = select_transactions(&storage, plan_id, &filter).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].transaction_date, date(15));

        let err = select_transactions(&storage, PlanId::new(), &LedgerFilter::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_export_each_format() {
        let (_temp, storage, plan_id) = seeded();
        let filter = LedgerFilter::new();

        let csv = export_transactions(&storage, plan_id, ExportFormat::Csv, &filter).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert_eq!(csv.lines().count(), 5);
        assert!(csv.contains("WITHDRAWAL"));

        let json = export_transactions(&storage, plan_id, ExportFormat::Json, &filter).unwrap();
        let parsed: PlanExport = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.plan_name, "Emergency");
        assert_eq!(parsed.transactions.len(), 4);
        assert_eq!(parsed.totals.balance(), Money::from_units(80));

        let yaml = export_transactions(&storage, plan_id, ExportFormat::Yaml, &filter).unwrap();
        let yaml = String::from_utf8(yaml).unwrap();
        assert!(yaml.starts_with("# Savings ledger export"));
        let parsed: PlanExport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.transactions.len(), 4);
    }

    #[test]
    fn test_export_balance_matches_entries_during_writes() {
        use crate::services::testing::{context, date as ymd};
        use crate::services::{CreateTransactionInput, TransactionService};

        let (_temp, ctx, _sink) = context(ymd(2024, 5, 20));
        let plan = Plan::new(
            "Emergency",
            Money::from_units(1_000_000),
            Money::from_units(50),
            Frequency::Weekly,
            date(1),
        );
        let plan_id = plan.id;
        ctx.storage.plans.commit(plan).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let service = TransactionService::new(&ctx);
                for _ in 0..40 {
                    service
                        .create(
                            CreateTransactionInput::new(
                                plan_id,
                                TransactionType::Extra,
                                Money::from_units(5),
                            )
                            .on(date(10)),
                        )
                        .unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..40 {
                    let json = export_transactions(
                        &ctx.storage,
                        plan_id,
                        ExportFormat::Json,
                        &LedgerFilter::new(),
                    )
                    .unwrap();
                    let parsed: PlanExport = serde_json::from_slice(&json).unwrap();
                    assert_eq!(parsed.totals.balance(), parsed.current_amount);
                }
            });
        });
    }
}
