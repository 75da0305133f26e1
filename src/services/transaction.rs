//! Transaction service
//!
//! Records ledger entries against plans. Validation, the durable append and
//! the balance recompute run under the plan lock as one unit; if any step
//! fails the ledger and the plan are left as they were.

use chrono::{NaiveDate, Utc};

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Plan, PlanId, Transaction, TransactionId, TransactionType};
use crate::storage::{LedgerFilter, LedgerTotals};

use super::balance::{self, BalanceOutcome};
use super::locks::LockKey;
use super::validator::{self, RuleInput};
use super::LedgerContext;

/// Input for recording a ledger entry
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub plan_id: PlanId,
    pub kind: TransactionType,
    pub amount: Money,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub is_catch_up: bool,
}

impl CreateTransactionInput {
    pub fn new(plan_id: PlanId, kind: TransactionType, amount: Money) -> Self {
        Self {
            plan_id,
            kind,
            amount,
            date: None,
            note: None,
            is_catch_up: false,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn catch_up(mut self) -> Self {
        self.is_catch_up = true;
        self
    }
}

/// Service for ledger entries
pub struct TransactionService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> TransactionService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Validate and record an entry, updating the plan balance
    pub fn create(&self, input: CreateTransactionInput) -> LedgerResult<Transaction> {
        let _lock = self.ctx.locks().acquire(LockKey::Plan(input.plan_id))?;
        let _gate = self.ctx.storage.begin_write()?;

        let plan = self.writable_plan(input.plan_id)?;
        let today = self.ctx.today();

        let mut candidate = Transaction::new(
            plan.id,
            input.kind,
            input.amount,
            input.date.unwrap_or(today),
        )
        .catch_up(input.is_catch_up);
        if let Some(note) = input.note {
            candidate = candidate.with_note(note);
        }

        let ledger = self
            .ctx
            .storage
            .ledger
            .list_by_plan(plan.id, &LedgerFilter::new())?;
        if let Err(e) = validator::validate(&RuleInput {
            candidate: &candidate,
            plan: &plan,
            ledger: &ledger,
            today,
        }) {
            tracing::debug!(plan = %plan.id, code = e.code(), "transaction rejected");
            return Err(e);
        }

        let (plan, outcome) = self.append_and_rebalance(plan, candidate.clone())?;

        self.ctx.storage.log_create(
            EntityType::Transaction,
            candidate.id.to_string(),
            Some(plan.name.clone()),
            &candidate,
        );
        tracing::info!(
            plan = %plan.id,
            kind = %candidate.kind,
            amount = %candidate.amount,
            balance = %outcome.balance,
            "transaction recorded"
        );
        Ok(candidate)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.ctx.storage.ledger.get(id)
    }

    /// Find a transaction by full or short ID
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Transaction>> {
        if let Ok(id) = identifier.parse::<TransactionId>() {
            return self.ctx.storage.ledger.get(id);
        }
        let needle = identifier.trim().to_lowercase();
        let prefix = needle.strip_prefix("txn-").unwrap_or(&needle);
        if prefix.len() < 4 {
            return Ok(None);
        }
        let mut matches = self
            .ctx
            .storage
            .ledger
            .get_all()?
            .into_iter()
            .filter(|t| t.id.to_string().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(t), None) => Ok(Some(t)),
            _ => Ok(None),
        }
    }

    /// A plan's ledger in ledger order
    pub fn list(&self, plan_id: PlanId, filter: &LedgerFilter) -> LedgerResult<Vec<Transaction>> {
        if self.ctx.storage.plans.get(plan_id)?.is_none() {
            return Err(LedgerError::plan_not_found(plan_id.to_string()));
        }
        self.ctx.storage.ledger.list_by_plan(plan_id, filter)
    }

    /// Remove an entry and reverse its effect on the plan balance.
    ///
    /// Rejected when the remaining ledger would fold to a negative balance.
    /// A completed plan stays completed.
    pub fn delete(&self, id: TransactionId) -> LedgerResult<Transaction> {
        let plan_id = self
            .ctx
            .storage
            .ledger
            .get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?
            .plan_id;

        let _lock = self.ctx.locks().acquire(LockKey::Plan(plan_id))?;
        let _gate = self.ctx.storage.begin_write()?;

        // Re-read under the lock; another writer may have removed it
        let txn = self
            .ctx
            .storage
            .ledger
            .get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
        let mut plan = self.writable_plan(plan_id)?;

        let remaining: Vec<_> = self
            .ctx
            .storage
            .ledger
            .list_by_plan(plan_id, &LedgerFilter::new())?
            .into_iter()
            .filter(|t| t.id != id)
            .collect();
        let balance = balance::fold(&remaining);
        if balance.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                requested: txn.balance_effect(),
                available: plan.current_amount,
            });
        }

        self.ctx.storage.ledger.remove(id)?;
        let before = plan.clone();
        let outcome = balance::apply(&mut plan, balance, Utc::now());
        if let Err(e) = self.ctx.storage.plans.commit(plan.clone()) {
            self.restore_entry(txn.clone());
            return Err(e);
        }

        self.ctx.storage.log_delete(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(plan.name.clone()),
            &txn,
        );
        self.ctx.storage.log_update(
            EntityType::Plan,
            plan.id.to_string(),
            Some(plan.name.clone()),
            &before,
            &plan,
        );
        if outcome.completed_now {
            self.ctx.emit(balance::plan_completed(&plan));
        }
        tracing::info!(plan = %plan.id, txn = %txn.id, balance = %outcome.balance, "transaction deleted");
        Ok(txn)
    }

    /// Append an already-validated entry, refold, evaluate completion and
    /// persist the plan. Caller holds the plan lock and the commit gate.
    pub(crate) fn append_and_rebalance(
        &self,
        mut plan: Plan,
        entry: Transaction,
    ) -> LedgerResult<(Plan, BalanceOutcome)> {
        // Every ledger sum must stay representable once the entry is in
        let ledger = self
            .ctx
            .storage
            .ledger
            .list_by_plan(plan.id, &LedgerFilter::new())?;
        if LedgerTotals::checked_from_entries(ledger.iter().chain(std::iter::once(&entry)))
            .is_none()
        {
            tracing::debug!(plan = %plan.id, amount = %entry.amount, "entry would overflow ledger totals");
            return Err(LedgerError::InvalidAmount(entry.amount));
        }

        let entry_id = self.ctx.storage.ledger.append(entry)?;

        let balance = match self.ctx.storage.ledger.sum_by_plan(plan.id) {
            Ok(totals) => totals.balance(),
            Err(e) => {
                self.rollback_append(entry_id);
                return Err(e);
            }
        };

        let before = plan.clone();
        let outcome = balance::apply(&mut plan, balance, Utc::now());
        if let Err(e) = self.ctx.storage.plans.commit(plan.clone()) {
            self.rollback_append(entry_id);
            return Err(e);
        }

        self.ctx.storage.log_update(
            EntityType::Plan,
            plan.id.to_string(),
            Some(plan.name.clone()),
            &before,
            &plan,
        );
        if outcome.completed_now {
            self.ctx.emit(balance::plan_completed(&plan));
        }
        Ok((plan, outcome))
    }

    /// Plan that exists and still accepts entries
    pub(crate) fn writable_plan(&self, plan_id: PlanId) -> LedgerResult<Plan> {
        let plan = self
            .ctx
            .storage
            .plans
            .get(plan_id)?
            .ok_or_else(|| LedgerError::plan_not_found(plan_id.to_string()))?;
        if plan.archived {
            return Err(LedgerError::Validation(format!(
                "Plan '{}' is archived and no longer accepts transactions",
                plan.name
            )));
        }
        Ok(plan)
    }

    fn rollback_append(&self, id: TransactionId) {
        if let Err(e) = self.ctx.storage.ledger.remove(id) {
            tracing::error!(txn = %id, error = %e, "failed to roll back ledger append");
        }
    }

    fn restore_entry(&self, txn: Transaction) {
        let id = txn.id;
        if let Err(e) = self.ctx.storage.ledger.append(txn) {
            tracing::error!(txn = %id, error = %e, "failed to restore removed ledger entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::services::balance::fold;
    use crate::services::testing::{context, date};
    use crate::services::LedgerContext;

    fn seed_plan(ctx: &LedgerContext, target_units: i64) -> PlanId {
        let plan = Plan::new(
            "Emergency fund",
            Money::from_units(target_units),
            Money::from_units(100),
            Frequency::Monthly,
            date(2024, 1, 1),
        );
        let id = plan.id;
        ctx.storage.plans.commit(plan).unwrap();
        id
    }

    fn record(
        service: &TransactionService<'_>,
        plan_id: PlanId,
        kind: TransactionType,
        units: i64,
        on: NaiveDate,
    ) -> LedgerResult<Transaction> {
        service.create(CreateTransactionInput::new(plan_id, kind, Money::from_units(units)).on(on))
    }

    fn balance_of(ctx: &LedgerContext, plan_id: PlanId) -> Plan {
        ctx.storage.plans.get(plan_id).unwrap().unwrap()
    }

    #[test]
    fn test_worked_example() {
        let (_temp, ctx, sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let service = TransactionService::new(&ctx);

        record(&service, plan_id, TransactionType::Saved, 200, date(2024, 1, 1)).unwrap();
        let plan = balance_of(&ctx, plan_id);
        assert_eq!(plan.current_amount, Money::from_units(200));
        assert!(!plan.is_completed);

        let err = record(&service, plan_id, TransactionType::Withdrawal, 250, date(2024, 1, 1))
            .unwrap_err();
        match err {
            LedgerError::InsufficientFunds { available, .. } => {
                assert_eq!(available, Money::from_units(200))
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(balance_of(&ctx, plan_id).current_amount, Money::from_units(200));

        record(&service, plan_id, TransactionType::Extra, 800, date(2024, 1, 2)).unwrap();
        let plan = balance_of(&ctx, plan_id);
        assert_eq!(plan.current_amount, Money::from_units(1000));
        assert!(plan.is_completed);
        assert!(!plan.is_active);

        record(&service, plan_id, TransactionType::Withdrawal, 500, date(2024, 1, 3)).unwrap();
        let plan = balance_of(&ctx, plan_id);
        assert_eq!(plan.current_amount, Money::from_units(500));
        assert!(plan.is_completed);

        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_replay_matches_aggregate() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 100_000);
        let service = TransactionService::new(&ctx);

        let steps = [
            (TransactionType::Saved, 120, date(2024, 2, 1)),
            (TransactionType::Partial, 40, date(2024, 2, 2)),
            (TransactionType::Missed, 100, date(2024, 3, 1)),
            (TransactionType::Withdrawal, 70, date(2024, 3, 2)),
            (TransactionType::Saved, 100, date(2024, 3, 2)),
            (TransactionType::Extra, 15, date(2024, 3, 2)),
        ];
        for (kind, units, on) in steps {
            record(&service, plan_id, kind, units, on).unwrap();
        }

        let ledger = service.list(plan_id, &LedgerFilter::new()).unwrap();
        assert_eq!(ledger.len(), 6);
        assert_eq!(fold(&ledger), balance_of(&ctx, plan_id).current_amount);
        assert_eq!(fold(&ledger), Money::from_units(205));
    }

    #[test]
    fn test_duplicate_and_exempt_entries() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 10_000);
        let service = TransactionService::new(&ctx);
        let day = date(2024, 5, 5);

        record(&service, plan_id, TransactionType::Saved, 10, day).unwrap();
        assert!(matches!(
            record(&service, plan_id, TransactionType::Saved, 10, day),
            Err(LedgerError::DuplicateTransaction { .. })
        ));
        record(&service, plan_id, TransactionType::Extra, 10, day).unwrap();
        service
            .create(
                CreateTransactionInput::new(plan_id, TransactionType::Saved, Money::from_units(10))
                    .on(day)
                    .catch_up(),
            )
            .unwrap();

        assert_eq!(balance_of(&ctx, plan_id).current_amount, Money::from_units(30));
    }

    #[test]
    fn test_rejections_leave_no_trace() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let service = TransactionService::new(&ctx);

        assert!(matches!(
            record(&service, plan_id, TransactionType::Extra, 0, date(2024, 5, 1)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            record(&service, plan_id, TransactionType::Extra, 5, date(2024, 6, 2)),
            Err(LedgerError::InvalidDate(_))
        ));
        assert!(matches!(
            record(&service, PlanId::new(), TransactionType::Extra, 5, date(2024, 5, 1)),
            Err(LedgerError::NotFound { .. })
        ));
        assert_eq!(ctx.storage.ledger.count().unwrap(), 0);
        assert!(ctx.storage.audit().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_archived_plan_rejects_entries() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let mut plan = balance_of(&ctx, plan_id);
        plan.archive();
        ctx.storage.plans.commit(plan).unwrap();

        let err = record(
            &TransactionService::new(&ctx),
            plan_id,
            TransactionType::Extra,
            5,
            date(2024, 5, 1),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_default_date_is_today_and_note_kept() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let txn = TransactionService::new(&ctx)
            .create(
                CreateTransactionInput::new(plan_id, TransactionType::Saved, Money::from_units(5))
                    .note("  birthday money "),
            )
            .unwrap();
        assert_eq!(txn.transaction_date, date(2024, 6, 1));
        assert_eq!(txn.note.as_deref(), Some("birthday money"));
        assert!(!txn.is_manual);
    }

    #[test]
    fn test_overflowing_deposit_is_rejected_before_append() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let service = TransactionService::new(&ctx);
        let half = Money::from_cents(i64::MAX / 2 + 10);

        service
            .create(CreateTransactionInput::new(plan_id, TransactionType::Extra, half).on(date(2024, 1, 1)))
            .unwrap();
        let err = service
            .create(CreateTransactionInput::new(plan_id, TransactionType::Extra, half).on(date(2024, 1, 2)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(amount) if amount == half));

        let ledger = service.list(plan_id, &LedgerFilter::new()).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(fold(&ledger), balance_of(&ctx, plan_id).current_amount);
        assert_eq!(balance_of(&ctx, plan_id).current_amount, half);
    }

    #[test]
    fn test_delete_reverses_effect() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1000);
        let service = TransactionService::new(&ctx);

        let saved = record(&service, plan_id, TransactionType::Saved, 300, date(2024, 5, 1)).unwrap();
        record(&service, plan_id, TransactionType::Withdrawal, 100, date(2024, 5, 2)).unwrap();

        // Dropping the deposit would leave the withdrawal uncovered
        assert!(matches!(
            service.delete(saved.id),
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(balance_of(&ctx, plan_id).current_amount, Money::from_units(200));

        let extra = record(&service, plan_id, TransactionType::Extra, 50, date(2024, 5, 3)).unwrap();
        service.delete(extra.id).unwrap();
        assert_eq!(balance_of(&ctx, plan_id).current_amount, Money::from_units(200));
        assert!(service.get(extra.id).unwrap().is_none());
        assert!(matches!(
            service.delete(extra.id),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 1));
        let plan_id = seed_plan(&ctx, 1_000_000);
        TransactionService::new(&ctx)
            .create(
                CreateTransactionInput::new(plan_id, TransactionType::Extra, Money::from_units(1000))
                    .on(date(2024, 1, 1)),
            )
            .unwrap();

        std::thread::scope(|scope| {
            for i in 0..8 {
                let ctx = &ctx;
                scope.spawn(move || {
                    let service = TransactionService::new(ctx);
                    let kind = if i % 2 == 0 {
                        TransactionType::Extra
                    } else {
                        TransactionType::Withdrawal
                    };
                    let amount = if i % 2 == 0 { 50 } else { 30 };
                    service
                        .create(
                            CreateTransactionInput::new(plan_id, kind, Money::from_units(amount))
                                .on(date(2024, 2, 1)),
                        )
                        .unwrap();
                });
            }
        });

        let plan = balance_of(&ctx, plan_id);
        assert_eq!(plan.current_amount, Money::from_units(1000 + 4 * 50 - 4 * 30));
        let ledger = ctx.storage.ledger.list_by_plan(plan_id, &LedgerFilter::new()).unwrap();
        assert_eq!(fold(&ledger), plan.current_amount);
    }
}
