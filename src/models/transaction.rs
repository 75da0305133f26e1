//! Transaction model
//!
//! A ledger entry against a savings plan. Entries are immutable once
//! appended; corrections are made with new entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{PlanId, TransactionId};
use super::money::Money;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// The regular per-period contribution
    Saved,
    /// A contribution on top of the regular one
    Extra,
    /// Less than the scheduled contribution
    Partial,
    /// A skipped contribution; recorded for reporting only
    Missed,
    /// Money taken out of the plan
    Withdrawal,
}

impl TransactionType {
    /// All variants in display order
    pub const ALL: [TransactionType; 5] = [
        Self::Saved,
        Self::Extra,
        Self::Partial,
        Self::Missed,
        Self::Withdrawal,
    ];

    /// Signed effect of an entry of this type on the plan balance
    pub fn balance_effect(&self, amount: Money) -> Money {
        match self {
            Self::Saved | Self::Extra | Self::Partial => amount,
            Self::Withdrawal => -amount,
            Self::Missed => Money::zero(),
        }
    }

    /// Adds to the balance
    pub fn is_deposit(&self) -> bool {
        matches!(self, Self::Saved | Self::Extra | Self::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "SAVED",
            Self::Extra => "EXTRA",
            Self::Partial => "PARTIAL",
            Self::Missed => "MISSED",
            Self::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAVED" | "SAVE" => Ok(Self::Saved),
            "EXTRA" => Ok(Self::Extra),
            "PARTIAL" => Ok(Self::Partial),
            "MISSED" | "MISS" => Ok(Self::Missed),
            "WITHDRAWAL" | "WITHDRAW" => Ok(Self::Withdrawal),
            other => Err(format!(
                "Unknown transaction type '{}'. Use saved, extra, partial, missed or withdrawal",
                other.to_lowercase()
            )),
        }
    }
}

/// A ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The plan this entry belongs to
    pub plan_id: PlanId,

    /// Always positive; direction comes from `kind`
    pub amount: Money,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Calendar date the entry applies to
    pub transaction_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Entered by hand rather than by a schedule, or a balance override
    #[serde(default)]
    pub is_manual: bool,

    /// Compensates a previously missed period
    #[serde(default)]
    pub is_catch_up: bool,

    /// Server timestamp of the append
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new ledger entry
    pub fn new(
        plan_id: PlanId,
        kind: TransactionType,
        amount: Money,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            plan_id,
            amount,
            kind,
            transaction_date,
            note: None,
            is_manual: false,
            is_catch_up: false,
            created_at: Utc::now(),
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note.trim().to_string())
        };
        self
    }

    /// Mark as a balance override entry
    pub fn manual(mut self) -> Self {
        self.is_manual = true;
        self
    }

    /// Mark as a catch-up contribution
    pub fn catch_up(mut self, is_catch_up: bool) -> Self {
        self.is_catch_up = is_catch_up;
        self
    }

    /// Signed effect on the plan balance
    pub fn balance_effect(&self) -> Money {
        self.kind.balance_effect(self.amount)
    }

    /// A regular contribution that counts toward the one-per-day rule
    pub fn is_regular_saving(&self) -> bool {
        self.kind == TransactionType::Saved && !self.is_catch_up
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.transaction_date.format("%Y-%m-%d"),
            self.kind,
            self.amount
        )?;
        if self.is_catch_up {
            write!(f, " (catch-up)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_effects() {
        let amount = Money::from_units(50);
        assert_eq!(TransactionType::Saved.balance_effect(amount), amount);
        assert_eq!(TransactionType::Extra.balance_effect(amount), amount);
        assert_eq!(TransactionType::Partial.balance_effect(amount), amount);
        assert_eq!(TransactionType::Withdrawal.balance_effect(amount), -amount);
        assert_eq!(TransactionType::Missed.balance_effect(amount), Money::zero());
    }

    #[test]
    fn test_regular_saving() {
        let plan = PlanId::new();
        let txn = Transaction::new(plan, TransactionType::Saved, Money::from_units(10), date(2024, 1, 1));
        assert!(txn.is_regular_saving());
        assert!(!txn.clone().catch_up(true).is_regular_saving());

        let extra = Transaction::new(plan, TransactionType::Extra, Money::from_units(10), date(2024, 1, 1));
        assert!(!extra.is_regular_saving());
    }

    #[test]
    fn test_type_parse() {
        assert_eq!("saved".parse::<TransactionType>().unwrap(), TransactionType::Saved);
        assert_eq!("Withdraw".parse::<TransactionType>().unwrap(), TransactionType::Withdrawal);
        assert!("bonus".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_serialized_type_tag() {
        let txn = Transaction::new(PlanId::new(), TransactionType::Withdrawal, Money::from_units(5), date(2024, 3, 9))
            .with_note("  car repair ");
        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["type"], "WITHDRAWAL");
        assert_eq!(json["note"], "car repair");
        assert_eq!(json["transaction_date"], "2024-03-09");
    }

    #[test]
    fn test_display() {
        let txn = Transaction::new(PlanId::new(), TransactionType::Saved, Money::from_cents(2500), date(2025, 1, 15))
            .catch_up(true);
        assert_eq!(format!("{}", txn), "2025-01-15 SAVED $25.00 (catch-up)");
    }
}
