//! Goal service
//!
//! Goals move only through add and withdraw deltas, each applied under the
//! goal lock as a single read-modify-write.

use chrono::{NaiveDate, Utc};

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Goal, GoalId, Money};

use super::balance;
use super::locks::LockKey;
use super::LedgerContext;

/// Input for creating a goal
#[derive(Debug, Clone)]
pub struct CreateGoalInput {
    pub name: String,
    pub target_amount: Money,
    /// 1 to 5, defaults to 3
    pub priority: Option<u8>,
    pub deadline: Option<NaiveDate>,
}

pub struct GoalService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> GoalService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    pub fn create(&self, input: CreateGoalInput) -> LedgerResult<Goal> {
        let mut goal = Goal::new(input.name.trim(), input.target_amount);
        if let Some(priority) = input.priority {
            goal = goal.with_priority(priority);
        }
        goal.deadline = input.deadline;

        goal.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        {
            let _gate = self.ctx.storage.begin_write()?;
            self.ctx.storage.goals.commit(goal.clone())?;
        }

        self.ctx.storage.log_create(
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &goal,
        );
        tracing::info!(goal = %goal.id, name = %goal.name, "goal created");
        Ok(goal)
    }

    pub fn get(&self, id: GoalId) -> LedgerResult<Option<Goal>> {
        self.ctx.storage.goals.get(id)
    }

    /// Find a goal by name (case-insensitive) or ID string
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Goal>> {
        let wanted = identifier.trim().to_lowercase();
        if let Some(goal) = self
            .ctx
            .storage
            .goals
            .get_all()?
            .into_iter()
            .find(|g| g.name.to_lowercase() == wanted)
        {
            return Ok(Some(goal));
        }

        if let Ok(id) = identifier.parse::<GoalId>() {
            return self.ctx.storage.goals.get(id);
        }

        Ok(None)
    }

    /// All goals, highest priority first
    pub fn list(&self) -> LedgerResult<Vec<Goal>> {
        self.ctx.storage.goals.get_all()
    }

    /// Add to a goal's balance
    pub fn add_amount(&self, id: GoalId, amount: Money) -> LedgerResult<Goal> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.apply_delta(id, amount)
    }

    /// Take from a goal's balance; fails with InsufficientFunds past zero.
    /// A completed goal stays completed.
    pub fn withdraw_amount(&self, id: GoalId, amount: Money) -> LedgerResult<Goal> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.apply_delta(id, -amount)
    }

    fn apply_delta(&self, id: GoalId, delta: Money) -> LedgerResult<Goal> {
        let _lock = self.ctx.locks().acquire(LockKey::Goal(id))?;
        let _gate = self.ctx.storage.begin_write()?;

        let mut goal = self
            .ctx
            .storage
            .goals
            .get(id)?
            .ok_or_else(|| LedgerError::goal_not_found(id.to_string()))?;

        let before = goal.clone();
        let completed_now = balance::apply_goal_delta(&mut goal, delta, Utc::now())?;
        self.ctx.storage.goals.commit(goal.clone())?;

        self.ctx.storage.log_update(
            EntityType::Goal,
            goal.id.to_string(),
            Some(goal.name.clone()),
            &before,
            &goal,
        );
        if completed_now {
            self.ctx.emit(balance::goal_completed(&goal));
        }
        tracing::info!(goal = %goal.id, %delta, balance = %goal.current_amount, "goal balance changed");
        Ok(goal)
    }
}
