//! Transaction CLI commands
//!
//! Ledger entries are added and listed per plan. Deleting an entry reverses
//! its effect on the plan balance.

use clap::Subcommand;

use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{LedgerError, LedgerResult};
use crate::models::TransactionType;
use crate::services::{CreateTransactionInput, LedgerContext, PlanService, TransactionService};
use crate::storage::LedgerFilter;

use super::{parse_money, parse_optional_date, parse_range, resolve_plan};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a ledger entry
    Add {
        /// Plan name or ID
        plan: String,
        /// Amount (always positive)
        amount: String,
        /// saved, extra, partial, missed or withdrawal
        #[arg(short = 't', long = "type", default_value = "saved")]
        kind: String,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Note
        #[arg(short, long)]
        note: Option<String>,
        /// Mark a SAVED entry as catching up a missed period
        #[arg(long)]
        catch_up: bool,
    },
    /// List a plan's ledger
    List {
        /// Plan name or ID
        plan: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Only these types (comma separated)
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        types: Vec<String>,
        /// Only catch-up entries
        #[arg(long)]
        catch_up: bool,
        /// Show at most this many of the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one entry
    Show {
        /// Transaction ID or short ID
        id: String,
    },
    /// Delete an entry and reverse its effect on the plan
    Delete {
        /// Transaction ID or short ID
        id: String,
    },
}

/// Parse a list of type names
pub(crate) fn parse_types(types: &[String]) -> LedgerResult<Option<Vec<TransactionType>>> {
    if types.is_empty() {
        return Ok(None);
    }
    types
        .iter()
        .map(|t| t.parse::<TransactionType>().map_err(LedgerError::Validation))
        .collect::<LedgerResult<Vec<_>>>()
        .map(Some)
}

/// Build a ledger filter from CLI flags
pub(crate) fn build_filter(
    from: Option<&str>,
    to: Option<&str>,
    types: &[String],
    catch_up: bool,
    limit: Option<usize>,
) -> LedgerResult<LedgerFilter> {
    let (start_date, end_date) = parse_range(from, to)?;
    Ok(LedgerFilter {
        start_date,
        end_date,
        types: parse_types(types)?,
        catch_up_only: catch_up,
        limit,
    })
}

/// Handle a transaction command
pub fn handle_transaction_command(
    ctx: &LedgerContext,
    cmd: TransactionCommands,
) -> LedgerResult<()> {
    let service = TransactionService::new(ctx);

    match cmd {
        TransactionCommands::Add {
            plan,
            amount,
            kind,
            date,
            note,
            catch_up,
        } => {
            let found = resolve_plan(ctx, &plan)?;
            let kind = kind.parse::<TransactionType>().map_err(LedgerError::Validation)?;

            let mut input = CreateTransactionInput::new(found.id, kind, parse_money(&amount)?);
            if let Some(date) = parse_optional_date(date.as_deref())? {
                input = input.on(date);
            }
            if let Some(note) = note {
                input = input.note(note);
            }
            if catch_up {
                input = input.catch_up();
            }

            let txn = service.create(input)?;
            let plan = PlanService::new(ctx).require(found.id)?;
            println!(
                "Recorded {} {} on {} for '{}'",
                txn.kind, txn.amount, txn.transaction_date, plan.name
            );
            println!("  Balance: {} of {}", plan.current_amount, plan.target_amount);
            if plan.is_completed && !found.is_completed {
                println!("  Target reached!");
            }
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            plan,
            from,
            to,
            types,
            catch_up,
            limit,
        } => {
            let found = resolve_plan(ctx, &plan)?;
            let filter = build_filter(from.as_deref(), to.as_deref(), &types, catch_up, limit)?;
            let entries = service.list(found.id, &filter)?;
            println!("Plan: {} ({} entries)", found.name, entries.len());
            print!("{}", format_transaction_register(&entries));
        }

        TransactionCommands::Show { id } => {
            let txn = service
                .find(&id)?
                .ok_or_else(|| LedgerError::transaction_not_found(&id))?;
            let plan_name = PlanService::new(ctx)
                .get(txn.plan_id)?
                .map(|p| p.name)
                .unwrap_or_else(|| txn.plan_id.short());
            print!("{}", format_transaction_details(&txn, &plan_name));
        }

        TransactionCommands::Delete { id } => {
            let txn = service
                .find(&id)?
                .ok_or_else(|| LedgerError::transaction_not_found(&id))?;
            let removed = service.delete(txn.id)?;
            println!(
                "Deleted {} {} from {}",
                removed.kind, removed.amount, removed.transaction_date
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let filter = build_filter(
            Some("2024-01-01"),
            None,
            &["saved".to_string(), "extra".to_string()],
            false,
            Some(5),
        )
        .unwrap();
        assert_eq!(
            filter.types,
            Some(vec![TransactionType::Saved, TransactionType::Extra])
        );
        assert_eq!(filter.limit, Some(5));
        assert!(filter.end_date.is_none());

        assert!(build_filter(None, None, &["bonus".to_string()], false, None)
            .unwrap_err()
            .is_validation());
    }
}
