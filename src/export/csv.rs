//! CSV export of ledger entries

use std::io::Write;

use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::Transaction;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Type")]
    kind: &'static str,
    /// Decimal amount, always positive
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Balance Effect")]
    balance_effect: String,
    #[serde(rename = "Catch Up")]
    is_catch_up: bool,
    #[serde(rename = "Manual")]
    is_manual: bool,
    #[serde(rename = "Note")]
    note: &'a str,
}

fn decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, (cents / 100).abs(), (cents % 100).abs())
}

/// Write entries as CSV with a header row
pub fn write_transactions_csv<W: Write>(
    transactions: &[Transaction],
    writer: W,
) -> LedgerResult<()> {
    let mut csv = csv::Writer::from_writer(writer);

    if transactions.is_empty() {
        csv.write_record([
            "ID",
            "Date",
            "Type",
            "Amount",
            "Balance Effect",
            "Catch Up",
            "Manual",
            "Note",
        ])
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    for txn in transactions {
        csv.serialize(CsvRow {
            id: txn.id.to_string(),
            date: txn.transaction_date.format("%Y-%m-%d").to_string(),
            kind: txn.kind.as_str(),
            amount: decimal(txn.amount.cents()),
            balance_effect: decimal(txn.balance_effect().cents()),
            is_catch_up: txn.is_catch_up,
            is_manual: txn.is_manual,
            note: txn.note.as_deref().unwrap_or(""),
        })
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    csv.flush().map_err(|e| LedgerError::Export(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, PlanId, TransactionType};
    use chrono::NaiveDate;

    #[test]
    fn test_decimal() {
        assert_eq!(decimal(12345), "123.45");
        assert_eq!(decimal(-5), "-0.05");
        assert_eq!(decimal(0), "0.00");
    }

    #[test]
    fn test_rows_and_quoting() {
        let plan = PlanId::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let txns = vec![
            Transaction::new(plan, TransactionType::Saved, Money::from_cents(5050), date)
                .with_note("first, with comma"),
            Transaction::new(plan, TransactionType::Withdrawal, Money::from_units(20), date),
        ];

        let mut out = Vec::new();
        write_transactions_csv(&txns, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "ID,Date,Type,Amount,Balance Effect,Catch Up,Manual,Note");
        assert!(lines[1].ends_with("2024-05-01,SAVED,50.50,50.50,false,true,\"first, with comma\""));
        assert!(lines[2].contains("WITHDRAWAL,20.00,-20.00"));
    }

    #[test]
    fn test_empty_export_has_header() {
        let mut out = Vec::new();
        write_transactions_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
