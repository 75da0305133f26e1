//! Savings plan model
//!
//! A plan is a savings target fed by periodic contributions. Its
//! `current_amount` is derived from the ledger and is only written by the
//! balance engine.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PlanId;
use super::money::Money;

/// How often a plan expects a contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom { days: u32 },
}

impl Frequency {
    pub fn description(&self) -> String {
        match self {
            Self::Daily => "Daily".to_string(),
            Self::Weekly => "Weekly".to_string(),
            Self::Monthly => "Monthly".to_string(),
            Self::Yearly => "Yearly".to_string(),
            Self::Custom { days } => format!("Every {} days", days),
        }
    }

    /// Parse "daily", "weekly", "monthly", "yearly" or "custom:<days>"
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annual" => Ok(Self::Yearly),
            other => match other.strip_prefix("custom:") {
                Some(days) => days
                    .parse::<u32>()
                    .map(|days| Self::Custom { days })
                    .map_err(|_| format!("Invalid custom interval: {}", days)),
                None => Err(format!(
                    "Unknown frequency '{}'. Use daily, weekly, monthly, yearly or custom:<days>",
                    other
                )),
            },
        }
    }

    /// Number of contribution periods that have started between `start` and
    /// `today`, inclusive of the first one
    pub fn periods_started(&self, start: NaiveDate, today: NaiveDate) -> i64 {
        if today < start {
            return 0;
        }
        let days = (today - start).num_days();
        match self {
            Self::Daily => days + 1,
            Self::Weekly => days / 7 + 1,
            Self::Custom { days: interval } => days / i64::from((*interval).max(1)) + 1,
            Self::Monthly => {
                let mut months = months_between(start, today);
                if today.day() < start.day() {
                    months -= 1;
                }
                i64::from(months.max(0)) + 1
            }
            Self::Yearly => {
                let mut years = today.year() - start.year();
                if (today.month(), today.day()) < (start.month(), start.day()) {
                    years -= 1;
                }
                i64::from(years.max(0)) + 1
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let years = end.year() - start.year();
    let months = end.month() as i32 - start.month() as i32;
    years * 12 + months
}

/// A savings plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub target_amount: Money,
    pub amount_per_period: Money,
    pub frequency: Frequency,
    /// Fold of the plan's ledger
    #[serde(default)]
    pub current_amount: Money,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// One-way flag; set the first time the balance reaches the target
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-deleted; kept because ledger entries reference it
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Plan {
    pub fn new(
        name: impl Into<String>,
        target_amount: Money,
        amount_per_period: Money,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PlanId::new(),
            name: name.into(),
            target_amount,
            amount_per_period,
            frequency,
            current_amount: Money::zero(),
            start_date,
            end_date: None,
            is_active: true,
            is_completed: false,
            completed_at: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Amount still needed to reach the target (zero once reached)
    pub fn remaining(&self) -> Money {
        let remaining = self.target_amount - self.current_amount;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }

    /// Live check used for progress display; distinct from `is_completed`
    pub fn target_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    /// Contributions the schedule expects by `today`
    pub fn scheduled_amount(&self, today: NaiveDate) -> Money {
        let periods = self.frequency.periods_started(self.start_date, today);
        Money::from_cents(self.amount_per_period.cents().saturating_mul(periods))
    }

    pub fn archive(&mut self) {
        self.archived = true;
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if self.name.trim().is_empty() {
            return Err(PlanValidationError::EmptyName);
        }
        if !self.target_amount.is_positive() {
            return Err(PlanValidationError::NonPositiveTarget);
        }
        if !self.amount_per_period.is_positive() {
            return Err(PlanValidationError::NonPositiveContribution);
        }
        if self.current_amount.is_negative() {
            return Err(PlanValidationError::NegativeBalance);
        }
        if let Frequency::Custom { days } = self.frequency {
            if days == 0 {
                return Err(PlanValidationError::InvalidCustomInterval);
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(PlanValidationError::EndBeforeStart);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.name, self.current_amount, self.target_amount
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanValidationError {
    EmptyName,
    NonPositiveTarget,
    NonPositiveContribution,
    NegativeBalance,
    InvalidCustomInterval,
    EndBeforeStart,
}

impl fmt::Display for PlanValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Plan name cannot be empty"),
            Self::NonPositiveTarget => write!(f, "Target amount must be greater than zero"),
            Self::NonPositiveContribution => {
                write!(f, "Amount per period must be greater than zero")
            }
            Self::NegativeBalance => write!(f, "Plan balance cannot be negative"),
            Self::InvalidCustomInterval => write!(f, "Custom interval must be at least 1 day"),
            Self::EndBeforeStart => write!(f, "End date cannot be before the start date"),
        }
    }
}

impl std::error::Error for PlanValidationError {}
