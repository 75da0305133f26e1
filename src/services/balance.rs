//! Plan balance engine
//!
//! A plan's `current_amount` is always the fold of its ledger. Completion is
//! a one-way flag: it is set the first time the balance reaches the target
//! and never cleared by later withdrawals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::models::{Goal, Money, Plan, PlanId, Transaction};
use crate::storage::LedgerFilter;

use super::locks::LockKey;
use super::LedgerContext;

/// Replay a ledger into a balance
pub fn fold<'a>(ledger: impl IntoIterator<Item = &'a Transaction>) -> Money {
    ledger.into_iter().map(Transaction::balance_effect).sum()
}

/// Result of applying a new balance to a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceOutcome {
    pub previous: Money,
    pub balance: Money,
    /// True only on the transition to completed
    pub completed_now: bool,
}

/// Set the plan balance and evaluate completion
pub fn apply(plan: &mut Plan, balance: Money, now: DateTime<Utc>) -> BalanceOutcome {
    let previous = plan.current_amount;
    plan.current_amount = balance;
    plan.updated_at = now;

    let completed_now = !plan.is_completed && balance >= plan.target_amount;
    if completed_now {
        plan.is_completed = true;
        plan.is_active = false;
        plan.completed_at = Some(now);
    }

    BalanceOutcome {
        previous,
        balance,
        completed_now,
    }
}

/// Apply a signed delta to a goal; true when the goal completes with it
pub fn apply_goal_delta(goal: &mut Goal, delta: Money, now: DateTime<Utc>) -> LedgerResult<bool> {
    let balance = goal
        .current_amount
        .checked_add(delta)
        .ok_or(LedgerError::InvalidAmount(delta.abs()))?;
    if balance.is_negative() {
        return Err(LedgerError::InsufficientFunds {
            requested: -delta,
            available: goal.current_amount,
        });
    }

    goal.current_amount = balance;
    goal.updated_at = now;

    let completed_now = !goal.is_completed && goal.target_reached();
    if completed_now {
        goal.is_completed = true;
        goal.completed_at = Some(now);
    }
    Ok(completed_now)
}

pub fn plan_completed(plan: &Plan) -> LedgerEvent {
    LedgerEvent::PlanCompleted {
        plan_id: plan.id,
        name: plan.name.clone(),
        amount: plan.current_amount,
        completed_at: plan.completed_at.unwrap_or(plan.updated_at),
    }
}

pub fn goal_completed(goal: &Goal) -> LedgerEvent {
    LedgerEvent::GoalCompleted {
        goal_id: goal.id,
        name: goal.name.clone(),
        amount: goal.current_amount,
        completed_at: goal.completed_at.unwrap_or(goal.updated_at),
    }
}

/// A plan whose stored balance disagrees with its ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDrift {
    pub plan_id: PlanId,
    pub name: String,
    pub stored: Money,
    pub replayed: Money,
}

/// Ledger replay checks
pub struct BalanceService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> BalanceService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Replay every plan's ledger against a consistent snapshot
    pub fn verify(&self) -> LedgerResult<Vec<BalanceDrift>> {
        let snapshot = self.ctx.storage.snapshot()?;
        let drift = snapshot
            .plans
            .iter()
            .filter_map(|plan| {
                let replayed = fold(snapshot.ledger_for(plan.id));
                (replayed != plan.current_amount).then(|| BalanceDrift {
                    plan_id: plan.id,
                    name: plan.name.clone(),
                    stored: plan.current_amount,
                    replayed,
                })
            })
            .collect();
        Ok(drift)
    }

    /// Rewrite drifted balances from the ledger
    pub fn repair(&self) -> LedgerResult<Vec<BalanceDrift>> {
        let drift = self.verify()?;
        let mut repaired = Vec::with_capacity(drift.len());

        for found in drift {
            let _lock = self.ctx.locks().acquire(LockKey::Plan(found.plan_id))?;
            let _gate = self.ctx.storage.begin_write()?;

            let Some(mut plan) = self.ctx.storage.plans.get(found.plan_id)? else {
                continue;
            };
            let ledger = self
                .ctx
                .storage
                .ledger
                .list_by_plan(plan.id, &LedgerFilter::new())?;
            let replayed = fold(&ledger);
            if replayed == plan.current_amount {
                continue;
            }

            let before = plan.clone();
            let outcome = apply(&mut plan, replayed, Utc::now());
            self.ctx.storage.plans.commit(plan.clone())?;

            tracing::warn!(
                plan = %plan.id,
                stored = %outcome.previous,
                replayed = %outcome.balance,
                "repaired plan balance from ledger"
            );
            self.ctx.storage.log_update(
                EntityType::Plan,
                plan.id.to_string(),
                Some(plan.name.clone()),
                &before,
                &plan,
            );
            if outcome.completed_now {
                self.ctx.emit(plan_completed(&plan));
            }

            repaired.push(BalanceDrift {
                stored: outcome.previous,
                replayed,
                ..found
            });
        }

        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, TransactionType};
    use crate::services::testing::{context, date};

    fn plan(target_units: i64) -> Plan {
        Plan::new(
            "Bike",
            Money::from_units(target_units),
            Money::from_units(50),
            Frequency::Weekly,
            date(2024, 1, 1),
        )
    }

    #[test]
    fn test_fold() {
        let p = plan(1000);
        let ledger = vec![
            Transaction::new(p.id, TransactionType::Saved, Money::from_units(200), date(2024, 1, 1)),
            Transaction::new(p.id, TransactionType::Missed, Money::from_units(50), date(2024, 1, 8)),
            Transaction::new(p.id, TransactionType::Extra, Money::from_units(30), date(2024, 1, 9)),
            Transaction::new(p.id, TransactionType::Saved, Money::from_units(20), date(2024, 1, 10))
                .catch_up(true),
            Transaction::new(p.id, TransactionType::Withdrawal, Money::from_units(45), date(2024, 1, 11)),
        ];
        assert_eq!(fold(&ledger), Money::from_units(205));
        assert_eq!(fold(&[]), Money::zero());
    }

    #[test]
    fn test_completion_is_monotonic() {
        let mut p = plan(100);
        let now = Utc::now();

        let first = apply(&mut p, Money::from_units(100), now);
        assert!(first.completed_now);
        assert!(p.is_completed);
        assert!(!p.is_active);
        assert_eq!(p.completed_at, Some(now));

        let dropped = apply(&mut p, Money::from_units(40), now);
        assert!(!dropped.completed_now);
        assert!(p.is_completed);

        let again = apply(&mut p, Money::from_units(150), now);
        assert!(!again.completed_now);
    }

    #[test]
    fn test_goal_delta() {
        let mut goal = Goal::new("Phone", Money::from_units(100));
        let now = Utc::now();

        assert!(!apply_goal_delta(&mut goal, Money::from_units(60), now).unwrap());
        let err = apply_goal_delta(&mut goal, Money::from_units(-70), now).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(goal.current_amount, Money::from_units(60));

        assert!(apply_goal_delta(&mut goal, Money::from_units(40), now).unwrap());
        assert!(!apply_goal_delta(&mut goal, Money::from_units(-90), now).unwrap());
        assert!(goal.is_completed);

        let err = apply_goal_delta(&mut goal, Money::from_cents(i64::MAX), now).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
        assert_eq!(goal.current_amount, Money::from_units(10));
    }

    #[test]
    fn test_verify_and_repair() {
        let (_temp, ctx, sink) = context(date(2024, 3, 1));
        let p = plan(100);
        let plan_id = p.id;
        ctx.storage.plans.commit(p).unwrap();
        ctx.storage
            .ledger
            .append(Transaction::new(
                plan_id,
                TransactionType::Saved,
                Money::from_units(120),
                date(2024, 2, 1),
            ))
            .unwrap();

        let service = BalanceService::new(&ctx);
        let drift = service.verify().unwrap();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].stored, Money::zero());
        assert_eq!(drift[0].replayed, Money::from_units(120));

        let repaired = service.repair().unwrap();
        assert_eq!(repaired.len(), 1);
        assert!(service.verify().unwrap().is_empty());

        let stored = ctx.storage.plans.get(plan_id).unwrap().unwrap();
        assert!(stored.is_completed);
        assert_eq!(sink.len(), 1);
    }
}
