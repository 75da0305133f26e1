//! Plan service
//!
//! Creates, lists and archives savings plans, and applies manual balance
//! overrides. An override never writes `current_amount` directly: it appends
//! an adjustment entry for the difference so the ledger still replays to the
//! stored balance.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Frequency, Money, Plan, PlanId, Transaction, TransactionType};

use super::locks::LockKey;
use super::transaction::TransactionService;
use super::LedgerContext;

/// Note attached to override entries
pub const ADJUSTMENT_NOTE: &str = "Manual balance adjustment";

/// Input for creating a plan
#[derive(Debug, Clone)]
pub struct CreatePlanInput {
    pub name: String,
    pub target_amount: Money,
    pub amount_per_period: Money,
    pub frequency: Frequency,
    /// Defaults to today
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Service for plan management
pub struct PlanService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> PlanService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Create a new plan
    pub fn create(&self, input: CreatePlanInput) -> LedgerResult<Plan> {
        let name = input.name.trim();

        let mut plan = Plan::new(
            name,
            input.target_amount,
            input.amount_per_period,
            input.frequency,
            input.start_date.unwrap_or_else(|| self.ctx.today()),
        );
        plan.end_date = input.end_date;

        plan.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let inserted = {
            let _gate = self.ctx.storage.begin_write()?;
            self.ctx.storage.plans.commit_new(plan.clone())?
        };
        if !inserted {
            return Err(LedgerError::Validation(format!(
                "A plan named '{}' already exists",
                plan.name
            )));
        }

        self.ctx.storage.log_create(
            EntityType::Plan,
            plan.id.to_string(),
            Some(plan.name.clone()),
            &plan,
        );
        tracing::info!(plan = %plan.id, name = %plan.name, target = %plan.target_amount, "plan created");
        Ok(plan)
    }

    pub fn get(&self, id: PlanId) -> LedgerResult<Option<Plan>> {
        self.ctx.storage.plans.get(id)
    }

    /// Get a plan or fail with NotFound
    pub fn require(&self, id: PlanId) -> LedgerResult<Plan> {
        self.get(id)?
            .ok_or_else(|| LedgerError::plan_not_found(id.to_string()))
    }

    /// Find a plan by name or ID string
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Plan>> {
        if let Some(plan) = self.ctx.storage.plans.get_by_name(identifier)? {
            return Ok(Some(plan));
        }

        if let Ok(id) = identifier.parse::<PlanId>() {
            return self.ctx.storage.plans.get(id);
        }

        Ok(None)
    }

    /// List plans, optionally with archived ones
    pub fn list(&self, include_archived: bool) -> LedgerResult<Vec<Plan>> {
        if include_archived {
            self.ctx.storage.plans.get_all()
        } else {
            self.ctx.storage.plans.get_visible()
        }
    }

    /// Soft-delete a plan. Its ledger is kept.
    pub fn archive(&self, id: PlanId) -> LedgerResult<Plan> {
        let _lock = self.ctx.locks().acquire(LockKey::Plan(id))?;
        let _gate = self.ctx.storage.begin_write()?;

        let mut plan = self.require(id)?;
        if plan.archived {
            return Err(LedgerError::Validation(format!(
                "Plan '{}' is already archived",
                plan.name
            )));
        }

        let before = plan.clone();
        plan.archive();
        self.ctx.storage.plans.commit(plan.clone())?;

        self.ctx.storage.log_update(
            EntityType::Plan,
            plan.id.to_string(),
            Some(plan.name.clone()),
            &before,
            &plan,
        );
        tracing::info!(plan = %plan.id, "plan archived");
        Ok(plan)
    }

    /// Set the plan balance to `amount`.
    ///
    /// Appends an EXTRA entry for an increase or a WITHDRAWAL for a decrease,
    /// dated today and flagged manual. Completion is re-evaluated the same
    /// way as for any other entry.
    pub fn update_amount(&self, id: PlanId, amount: Money) -> LedgerResult<Plan> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let _lock = self.ctx.locks().acquire(LockKey::Plan(id))?;
        let _gate = self.ctx.storage.begin_write()?;

        let transactions = TransactionService::new(self.ctx);
        let plan = transactions.writable_plan(id)?;

        let delta = amount - plan.current_amount;
        if delta.is_zero() {
            return Ok(plan);
        }

        let kind = if delta.is_positive() {
            TransactionType::Extra
        } else {
            TransactionType::Withdrawal
        };
        let entry = Transaction::new(plan.id, kind, delta.abs(), self.ctx.today())
            .manual()
            .with_note(ADJUSTMENT_NOTE);
        let entry_id = entry.id;
        let audit_entry = entry.clone();

        let (plan, outcome) = transactions.append_and_rebalance(plan, entry)?;

        self.ctx.storage.log_create(
            EntityType::Transaction,
            entry_id.to_string(),
            Some(plan.name.clone()),
            &audit_entry,
        );
        tracing::info!(
            plan = %plan.id,
            from = %outcome.previous,
            to = %outcome.balance,
            "plan balance overridden"
        );
        Ok(plan)
    }
}
