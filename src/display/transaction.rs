//! Ledger entry display formatting

use crate::models::Transaction;

use super::truncate;

/// Format one register row
fn format_transaction_row(txn: &Transaction) -> String {
    let mut flags = String::new();
    if txn.is_catch_up {
        flags.push('C');
    }
    if txn.is_manual {
        flags.push('M');
    }

    format!(
        "{:<12} {} {:<10} {:>12} {:>12} {:<3} {}",
        txn.id.short(),
        txn.transaction_date.format("%Y-%m-%d"),
        txn.kind.as_str(),
        txn.amount.to_string(),
        txn.balance_effect().to_string(),
        flags,
        truncate(txn.note.as_deref().unwrap_or(""), 30)
    )
}

/// Format entries as a register, in ledger order
pub fn format_transaction_register(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<10} {:<10} {:>12} {:>12} {:<3} {}\n",
        "ID", "Date", "Type", "Amount", "Effect", "Fl", "Note"
    ));
    output.push_str(&"-".repeat(84));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn));
        output.push('\n');
    }

    output
}

/// Format a single entry for display
pub fn format_transaction_details(txn: &Transaction, plan_name: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Plan:        {}\n", plan_name));
    output.push_str(&format!("Date:        {}\n", txn.transaction_date.format("%Y-%m-%d")));
    output.push_str(&format!("Type:        {}\n", txn.kind));
    output.push_str(&format!("Amount:      {}\n", txn.amount));
    if txn.is_catch_up {
        output.push_str("Catch-up:    yes\n");
    }
    if let Some(note) = &txn.note {
        output.push_str(&format!("Note:        {}\n", note));
    }
    output.push_str(&format!(
        "Recorded:    {}\n",
        txn.created_at.format("%Y-%m-%d %H:%M:%S")
    ));

    output
}
