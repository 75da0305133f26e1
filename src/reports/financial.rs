//! Financial summary for a report range

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::period::month_key;
use crate::models::{DateRange, Granularity, Money, Transaction, TransactionType};

/// Net movement for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDelta {
    /// "YYYY-MM"
    pub month: String,
    pub net: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_saved: Money,
    pub total_withdrawn: Money,
    pub net_savings: Money,
    pub average_monthly_savings: Money,
    pub months_in_range: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_month: Option<MonthDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_month: Option<MonthDelta>,
    pub missed_count: usize,
    pub missed_amount: Money,
    pub transaction_count: usize,
}

impl FinancialSummary {
    pub fn generate<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        range: DateRange,
    ) -> Self {
        let mut total_saved = Money::zero();
        let mut total_withdrawn = Money::zero();
        let mut missed_count = 0;
        let mut missed_amount = Money::zero();
        let mut transaction_count = 0;
        // Months without entries still count, with a zero delta
        let mut months: BTreeMap<String, Money> = range
            .buckets(Granularity::Month)
            .iter()
            .map(|bucket| (month_key(bucket.start), Money::zero()))
            .collect();

        for txn in transactions
            .into_iter()
            .filter(|t| range.contains(t.transaction_date))
        {
            transaction_count += 1;
            match txn.kind {
                TransactionType::Missed => {
                    missed_count += 1;
                    missed_amount += txn.amount;
                    continue;
                }
                TransactionType::Withdrawal => total_withdrawn += txn.amount,
                _ => total_saved += txn.amount,
            }
            *months
                .entry(month_key(txn.transaction_date))
                .or_insert_with(Money::zero) += txn.balance_effect();
        }

        let net_savings = total_saved - total_withdrawn;
        let months_in_range = range.months_touched();
        let average_monthly_savings =
            Money::from_cents(net_savings.cents() / i64::from(months_in_range));

        // Earliest month wins a tie in both directions
        let mut best_month: Option<MonthDelta> = None;
        let mut worst_month: Option<MonthDelta> = None;
        let ranked = if transaction_count > 0 {
            months
        } else {
            BTreeMap::new()
        };
        for (month, net) in ranked {
            if best_month.as_ref().map_or(true, |b| net > b.net) {
                best_month = Some(MonthDelta {
                    month: month.clone(),
                    net,
                });
            }
            if worst_month.as_ref().map_or(true, |w| net < w.net) {
                worst_month = Some(MonthDelta { month, net });
            }
        }

        Self {
            total_saved,
            total_withdrawn,
            net_savings,
            average_monthly_savings,
            months_in_range,
            best_month,
            worst_month,
            missed_count,
            missed_amount,
            transaction_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanId;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_range_has_no_division_by_zero() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 15)).unwrap();
        let summary = FinancialSummary::generate(&[], range);
        assert_eq!(summary.net_savings, Money::zero());
        assert_eq!(summary.average_monthly_savings, Money::zero());
        assert_eq!(summary.months_in_range, 1);
        assert!(summary.best_month.is_none());
        assert!(summary.worst_month.is_none());
    }

    #[test]
    fn test_totals_and_months() {
        let plan = PlanId::new();
        let txns = vec![
            Transaction::new(plan, TransactionType::Saved, Money::from_units(300), date(2024, 1, 5)),
            Transaction::new(plan, TransactionType::Withdrawal, Money::from_units(100), date(2024, 2, 5)),
            Transaction::new(plan, TransactionType::Saved, Money::from_units(50), date(2024, 2, 6)),
            Transaction::new(plan, TransactionType::Partial, Money::from_units(20), date(2024, 3, 1)),
            Transaction::new(plan, TransactionType::Missed, Money::from_units(100), date(2024, 3, 2)),
            Transaction::new(plan, TransactionType::Saved, Money::from_units(999), date(2023, 12, 31)),
        ];
        let range = DateRange::new(date(2024, 1, 1), date(2024, 3, 31)).unwrap();
        let summary = FinancialSummary::generate(&txns, range);

        assert_eq!(summary.total_saved, Money::from_units(370));
        assert_eq!(summary.total_withdrawn, Money::from_units(100));
        assert_eq!(summary.net_savings, Money::from_units(270));
        assert_eq!(summary.average_monthly_savings, Money::from_units(90));
        assert_eq!(summary.best_month.unwrap().month, "2024-01");
        let worst = summary.worst_month.unwrap();
        assert_eq!(worst.month, "2024-02");
        assert_eq!(worst.net, Money::from_units(-50));
        assert_eq!(summary.missed_count, 1);
        assert_eq!(summary.missed_amount, Money::from_units(100));
        assert_eq!(summary.transaction_count, 5);
    }

    #[test]
    fn test_month_without_entries_ranks_as_zero() {
        let plan = PlanId::new();
        let txns = vec![
            Transaction::new(plan, TransactionType::Saved, Money::from_units(100), date(2024, 1, 10)),
            Transaction::new(plan, TransactionType::Saved, Money::from_units(300), date(2024, 3, 10)),
        ];
        let range = DateRange::new(date(2024, 1, 1), date(2024, 3, 31)).unwrap();
        let summary = FinancialSummary::generate(&txns, range);

        assert_eq!(summary.months_in_range, 3);
        assert_eq!(summary.average_monthly_savings, Money::from_cents(13_333));
        assert_eq!(
            summary.worst_month,
            Some(MonthDelta {
                month: "2024-02".to_string(),
                net: Money::zero(),
            })
        );
        assert_eq!(summary.best_month.unwrap().month, "2024-03");
    }
}
