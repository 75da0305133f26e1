//! Ledger store for JSON storage
//!
//! Holds every plan's ledger in ledger.json with an index by plan. Entries
//! are only ever appended; the one removal path exists for transaction
//! deletion, which the service pairs with a balance recompute. Every write is
//! durable before the call returns, and an in-memory change is rolled back
//! when the durable write fails.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DateRange, Money, PlanId, Transaction, TransactionId, TransactionType};

use super::file_io::{read_json, write_json_atomic};

/// Serializable ledger file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerData {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: HashMap<TransactionId, Transaction>,
    /// Index: plan_id -> transaction ids in append order
    by_plan: HashMap<PlanId, Vec<TransactionId>>,
}

impl LedgerState {
    fn insert(&mut self, txn: Transaction) {
        self.by_plan.entry(txn.plan_id).or_default().push(txn.id);
        self.entries.insert(txn.id, txn);
    }

    fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let txn = self.entries.remove(&id)?;
        if let Some(ids) = self.by_plan.get_mut(&txn.plan_id) {
            ids.retain(|&tid| tid != id);
        }
        Some(txn)
    }

    fn plan_entries(&self, plan_id: PlanId) -> impl Iterator<Item = &Transaction> {
        self.by_plan
            .get(&plan_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.entries.get(id))
    }

    fn sorted_all(&self) -> Vec<Transaction> {
        let mut all: Vec<_> = self.entries.values().cloned().collect();
        sort_ledger(&mut all);
        all
    }
}

/// Ledger order: transaction date, then append time
pub fn sort_ledger(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

/// Options for selecting ledger entries
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Keep only these types (all types when None)
    pub types: Option<Vec<TransactionType>>,
    pub catch_up_only: bool,
    /// Keep only the most recent `limit` entries
    pub limit: Option<usize>,
}

impl LedgerFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by date range
    pub fn range(mut self, range: DateRange) -> Self {
        self.start_date = Some(range.start);
        self.end_date = Some(range.end);
        self
    }

    pub fn from(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn to(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Filter by transaction types
    pub fn types(mut self, types: Vec<TransactionType>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn catch_up_only(mut self) -> Self {
        self.catch_up_only = true;
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(start) = self.start_date {
            if txn.transaction_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if txn.transaction_date > end {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.contains(&txn.kind) {
                return false;
            }
        }
        !self.catch_up_only || txn.is_catch_up
    }

    /// Apply to an already ledger-ordered list
    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        let mut selected: Vec<_> = transactions.into_iter().filter(|t| self.matches(t)).collect();
        if let Some(limit) = self.limit {
            let skip = selected.len().saturating_sub(limit);
            selected.drain(..skip);
        }
        selected
    }
}

/// Per-plan sums of the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// SAVED, EXTRA and PARTIAL entries
    pub deposits: Money,
    pub withdrawals: Money,
    /// Shortfall recorded by MISSED entries; not part of the balance
    pub missed: Money,
}

impl LedgerTotals {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Self::default();
        for txn in entries {
            match txn.kind {
                TransactionType::Saved | TransactionType::Extra | TransactionType::Partial => {
                    totals.deposits += txn.amount
                }
                TransactionType::Withdrawal => totals.withdrawals += txn.amount,
                TransactionType::Missed => totals.missed += txn.amount,
            }
        }
        totals
    }

    /// Totals with every sum checked, or None if any of them overflows
    pub fn checked_from_entries<'a>(
        entries: impl IntoIterator<Item = &'a Transaction>,
    ) -> Option<Self> {
        let mut totals = Self::default();
        for txn in entries {
            let slot = match txn.kind {
                TransactionType::Saved | TransactionType::Extra | TransactionType::Partial => {
                    &mut totals.deposits
                }
                TransactionType::Withdrawal => &mut totals.withdrawals,
                TransactionType::Missed => &mut totals.missed,
            };
            *slot = slot.checked_add(txn.amount)?;
        }
        Some(totals)
    }

    /// Balance implied by the totals
    pub fn balance(&self) -> Money {
        self.deposits - self.withdrawals
    }
}

/// Repository for ledger persistence with a per-plan index
pub struct LedgerRepository {
    path: PathBuf,
    state: RwLock<LedgerState>,
}

impl LedgerRepository {
    /// Create a new ledger repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Load the ledger from disk and build the index
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: LedgerData = read_json(&self.path)?;

        let mut state = self.state.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        *state = LedgerState::default();
        let mut transactions = file_data.transactions;
        sort_ledger(&mut transactions);
        for txn in transactions {
            state.insert(txn);
        }

        Ok(())
    }

    /// Save the ledger to disk
    pub fn save(&self) -> LedgerResult<()> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        self.persist(&state)
    }

    fn persist(&self, state: &LedgerState) -> LedgerResult<()> {
        let file_data = LedgerData {
            transactions: state.sorted_all(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Append an entry and make it durable.
    ///
    /// The entry is not visible if the durable write fails.
    pub fn append(&self, txn: Transaction) -> LedgerResult<TransactionId> {
        let mut state = self.state.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if state.entries.contains_key(&txn.id) {
            return Err(LedgerError::Storage(format!(
                "Ledger entry {} already exists",
                txn.id
            )));
        }

        let id = txn.id;
        state.insert(txn);
        if let Err(e) = self.persist(&state) {
            state.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Remove an entry durably, restoring it if the write fails
    pub fn remove(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        let mut state = self.state.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let Some(removed) = state.remove(id) else {
            return Ok(None);
        };
        if let Err(e) = self.persist(&state) {
            state.insert(removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Get an entry by ID
    pub fn get(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(state.entries.get(&id).cloned())
    }

    /// A plan's entries in ledger order, filtered
    pub fn list_by_plan(
        &self,
        plan_id: PlanId,
        filter: &LedgerFilter,
    ) -> LedgerResult<Vec<Transaction>> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut entries: Vec<_> = state.plan_entries(plan_id).cloned().collect();
        sort_ledger(&mut entries);
        Ok(filter.apply(entries))
    }

    /// Every entry in ledger order
    pub fn get_all(&self) -> LedgerResult<Vec<Transaction>> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(state.sorted_all())
    }

    /// Totals of a plan's ledger
    pub fn sum_by_plan(&self, plan_id: PlanId) -> LedgerResult<LedgerTotals> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let totals = LedgerTotals::from_entries(state.plan_entries(plan_id));
        Ok(totals)
    }

    /// Count entries
    pub fn count(&self) -> LedgerResult<usize> {
        let state = self.state.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(state.entries.len())
    }
}
