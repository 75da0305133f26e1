//! Category breakdown
//!
//! Share of deposit volume per plan. Percentages are whole numbers assigned
//! by largest remainder, so a non-empty breakdown always sums to exactly 100.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{DateRange, Money, Plan, PlanId, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub plan_id: PlanId,
    pub plan_name: String,
    pub deposits: Money,
    pub transaction_count: usize,
    pub percentage: u32,
}

/// Split 100 across `amounts` in proportion, rounding by largest remainder.
///
/// Ties on the remainder go to the earlier index. Returns all zeros when the
/// total is not positive.
pub fn largest_remainder(amounts: &[i64]) -> Vec<u32> {
    let total: i128 = amounts.iter().map(|&a| i128::from(a.max(0))).sum();
    if total <= 0 {
        return vec![0; amounts.len()];
    }

    let mut shares = Vec::with_capacity(amounts.len());
    let mut remainders = Vec::with_capacity(amounts.len());
    for (index, &amount) in amounts.iter().enumerate() {
        let scaled = i128::from(amount.max(0)) * 100;
        shares.push((scaled / total) as u32);
        remainders.push((scaled % total, index));
    }

    let assigned: u32 = shares.iter().sum();
    let leftover = 100u32.saturating_sub(assigned) as usize;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, index) in remainders.iter().take(leftover) {
        shares[index] += 1;
    }
    shares
}

/// Deposits in `range` grouped by plan, largest first
pub fn category_breakdown(
    plans: &[Plan],
    transactions: &[Transaction],
    range: DateRange,
) -> Vec<CategoryShare> {
    let mut per_plan: HashMap<PlanId, (Money, usize)> = HashMap::new();
    for txn in transactions
        .iter()
        .filter(|t| t.kind.is_deposit() && range.contains(t.transaction_date))
    {
        let entry = per_plan.entry(txn.plan_id).or_insert((Money::zero(), 0));
        entry.0 += txn.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<CategoryShare> = plans
        .iter()
        .filter_map(|plan| {
            let (deposits, count) = per_plan.get(&plan.id)?;
            Some(CategoryShare {
                plan_id: plan.id,
                plan_name: plan.name.clone(),
                deposits: *deposits,
                transaction_count: *count,
                percentage: 0,
            })
        })
        .filter(|row| row.deposits.is_positive())
        .collect();

    rows.sort_by(|a, b| {
        b.deposits
            .cmp(&a.deposits)
            .then_with(|| a.plan_name.to_lowercase().cmp(&b.plan_name.to_lowercase()))
            .then(a.plan_id.cmp(&b.plan_id))
    });

    let amounts: Vec<i64> = rows.iter().map(|r| r.deposits.cents()).collect();
    for (row, pct) in rows.iter_mut().zip(largest_remainder(&amounts)) {
        row.percentage = pct;
    }
    rows
}
