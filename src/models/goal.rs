//! Savings goal model
//!
//! Goals have no ledger; their balance moves only through add and withdraw
//! deltas applied by the goal service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::GoalId;
use super::money::Money;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Money,
    #[serde(default)]
    pub current_amount: Money,
    /// 1 (lowest) to 5 (highest)
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_priority() -> u8 {
    3
}

impl Goal {
    pub fn new(name: impl Into<String>, target_amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            name: name.into(),
            target_amount,
            current_amount: Money::zero(),
            priority: default_priority(),
            deadline: None,
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Date the goal was opened, used as the start of its timeline
    pub fn start_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn remaining(&self) -> Money {
        let remaining = self.target_amount - self.current_amount;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }

    pub fn target_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if !self.target_amount.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget);
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(GoalValidationError::PriorityOutOfRange(self.priority));
        }
        if self.current_amount.is_negative() {
            return Err(GoalValidationError::NegativeBalance);
        }
        Ok(())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} (P{})",
            self.name, self.current_amount, self.target_amount, self.priority
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NonPositiveTarget,
    PriorityOutOfRange(u8),
    NegativeBalance,
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NonPositiveTarget => write!(f, "Target amount must be greater than zero"),
            Self::PriorityOutOfRange(p) => write!(
                f,
                "Priority must be between {} and {}, got {}",
                MIN_PRIORITY, MAX_PRIORITY, p
            ),
            Self::NegativeBalance => write!(f, "Goal balance cannot be negative"),
        }
    }
}

impl std::error::Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_goal() {
        let goal = Goal::new("Laptop", Money::from_units(1500));
        assert_eq!(goal.priority, 3);
        assert!(!goal.is_completed);
        assert_eq!(goal.remaining(), Money::from_units(1500));
        assert!(goal.validate().is_ok());
    }

    #[test]
    fn test_priority_range() {
        let goal = Goal::new("Laptop", Money::from_units(1500)).with_priority(6);
        assert_eq!(goal.validate(), Err(GoalValidationError::PriorityOutOfRange(6)));
        let goal = Goal::new("Laptop", Money::from_units(1500)).with_priority(0);
        assert!(goal.validate().is_err());
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut goal = Goal::new("Bike", Money::from_units(300));
        goal.current_amount = Money::from_units(350);
        assert_eq!(goal.remaining(), Money::zero());
        assert!(goal.target_reached());
    }
}
