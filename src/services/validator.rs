//! Transaction validation
//!
//! An ordered chain of pure checks run before an entry reaches the ledger.
//! The first failing rule decides the error; nothing here touches storage.

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Plan, Transaction, TransactionType};

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub candidate: &'a Transaction,
    pub plan: &'a Plan,
    /// The plan's existing ledger
    pub ledger: &'a [Transaction],
    pub today: NaiveDate,
}

type Rule = fn(&RuleInput<'_>) -> LedgerResult<()>;

/// Rules in the order they are applied
const RULES: [Rule; 4] = [
    positive_amount,
    withdrawal_covered,
    one_regular_saving_per_day,
    not_in_future,
];

/// Run every rule in order, stopping at the first failure
pub fn validate(input: &RuleInput<'_>) -> LedgerResult<()> {
    RULES.iter().try_for_each(|rule| rule(input))
}

fn positive_amount(input: &RuleInput<'_>) -> LedgerResult<()> {
    if input.candidate.amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(input.candidate.amount))
    }
}

fn withdrawal_covered(input: &RuleInput<'_>) -> LedgerResult<()> {
    let available = input.plan.current_amount;
    if input.candidate.kind == TransactionType::Withdrawal && input.candidate.amount > available {
        return Err(LedgerError::InsufficientFunds {
            requested: input.candidate.amount,
            available,
        });
    }
    Ok(())
}

fn one_regular_saving_per_day(input: &RuleInput<'_>) -> LedgerResult<()> {
    let candidate = input.candidate;
    if !candidate.is_regular_saving() {
        return Ok(());
    }
    let taken = input.ledger.iter().any(|t| {
        t.plan_id == candidate.plan_id
            && t.is_regular_saving()
            && t.transaction_date == candidate.transaction_date
    });
    if taken {
        return Err(LedgerError::DuplicateTransaction {
            plan: input.plan.name.clone(),
            date: candidate.transaction_date,
        });
    }
    Ok(())
}

fn not_in_future(input: &RuleInput<'_>) -> LedgerResult<()> {
    if input.candidate.transaction_date > input.today {
        return Err(LedgerError::InvalidDate(format!(
            "{} is in the future (today is {})",
            input.candidate.transaction_date, input.today
        )));
    }
    Ok(())
}
