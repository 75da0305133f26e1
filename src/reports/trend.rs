//! Savings trend
//!
//! One point per day and direction. `cumulative` starts from the balance
//! the included plans held the day before the range opens.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DateRange, Money, Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendKind {
    Saved,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub kind: TrendKind,
    /// Always positive; `kind` gives the direction
    pub amount: Money,
    pub cumulative: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTrend {
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub points: Vec<TrendPoint>,
}

/// Build the trend from entries in ledger order
pub fn savings_trend<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    range: DateRange,
) -> SavingsTrend {
    let mut opening_balance = Money::zero();
    // date -> (saved, withdrawn)
    let mut days: BTreeMap<NaiveDate, (Money, Money)> = BTreeMap::new();

    for txn in transactions {
        if txn.transaction_date < range.start {
            opening_balance += txn.balance_effect();
            continue;
        }
        if !range.contains(txn.transaction_date) {
            continue;
        }
        let day = days
            .entry(txn.transaction_date)
            .or_insert((Money::zero(), Money::zero()));
        match txn.kind {
            TransactionType::Saved | TransactionType::Extra | TransactionType::Partial => {
                day.0 += txn.amount
            }
            TransactionType::Withdrawal => day.1 += txn.amount,
            TransactionType::Missed => {}
        }
    }

    let mut cumulative = opening_balance;
    let mut points = Vec::new();
    for (date, (saved, withdrawn)) in days {
        if saved.is_positive() {
            cumulative += saved;
            points.push(TrendPoint {
                date,
                kind: TrendKind::Saved,
                amount: saved,
                cumulative,
            });
        }
        if withdrawn.is_positive() {
            cumulative -= withdrawn;
            points.push(TrendPoint {
                date,
                kind: TrendKind::Withdrawn,
                amount: withdrawn,
                cumulative,
            });
        }
    }

    SavingsTrend {
        opening_balance,
        closing_balance: cumulative,
        points,
    }
}
