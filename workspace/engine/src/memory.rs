//! In-process implementations of the collaborator traits.
//!
//! Used by the tests of this crate and by embedders that keep budgets in
//! memory. Both types can be switched into a failing or slow mode.

use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::ledger_transaction::TransactionKind;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::store::{checked_total, Budget, BudgetStore, LedgerQuery};

/// Shared switches for simulating an unhealthy backend.
#[derive(Debug, Default)]
struct FaultInjection {
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FaultInjection {
    async fn check(&self, what: &str) -> Result<()> {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Database(DbErr::Custom(format!("{what} unavailable"))));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct MemoryBudgetStore {
    budgets: Mutex<BTreeMap<i32, Budget>>,
    next_id: AtomicI32,
    writes: AtomicUsize,
    faults: FaultInjection,
}

impl Default for MemoryBudgetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self {
            budgets: Mutex::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
            writes: AtomicUsize::new(0),
            faults: FaultInjection::default(),
        }
    }

    /// Number of successful `create`, `update` and `delete` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.faults.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.faults.delay) = delay;
    }

    fn filtered(&self, keep: impl Fn(&Budget) -> bool) -> Vec<Budget> {
        lock(&self.budgets).values().filter(|b| keep(b)).cloned().collect()
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn create(&self, budget: Budget) -> Result<Budget> {
        self.faults.check("budget store").await?;
        let mut stored = budget;
        stored.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.budgets).insert(stored.id, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Budget>> {
        self.faults.check("budget store").await?;
        Ok(lock(&self.budgets).get(&id).cloned())
    }

    async fn get_all(&self, family_id: i32) -> Result<Vec<Budget>> {
        self.faults.check("budget store").await?;
        Ok(self.filtered(|b| b.family_id == family_id))
    }

    async fn get_active_budgets(&self, family_id: i32) -> Result<Vec<Budget>> {
        self.faults.check("budget store").await?;
        Ok(self.filtered(|b| b.family_id == family_id && b.is_active))
    }

    async fn get_by_category(&self, family_id: i32, category_id: i32) -> Result<Vec<Budget>> {
        self.faults.check("budget store").await?;
        Ok(self.filtered(|b| b.family_id == family_id && b.category_id == Some(category_id)))
    }

    async fn get_by_period(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Budget>> {
        self.faults.check("budget store").await?;
        Ok(self.filtered(|b| b.family_id == family_id && b.start_date <= end && b.end_date >= start))
    }

    async fn update(&self, budget: &Budget) -> Result<Budget> {
        self.faults.check("budget store").await?;
        let mut budgets = lock(&self.budgets);
        match budgets.get_mut(&budget.id) {
            Some(slot) => {
                *slot = budget.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(budget.clone())
            }
            None => Err(EngineError::NotFound(budget.id)),
        }
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.faults.check("budget store").await?;
        match lock(&self.budgets).remove(&id) {
            Some(_) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(EngineError::NotFound(id)),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    family_id: i32,
    category_id: Option<i32>,
    kind: TransactionKind,
    amount: Decimal,
    date: NaiveDate,
}

/// Ledger kept as a flat list of entries.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<Entry>>,
    faults: FaultInjection,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&self, family_id: i32, category_id: Option<i32>, amount: Decimal, date: NaiveDate) {
        self.push(family_id, category_id, TransactionKind::Expense, amount, date);
    }

    pub fn add_income(&self, family_id: i32, category_id: Option<i32>, amount: Decimal, date: NaiveDate) {
        self.push(family_id, category_id, TransactionKind::Income, amount, date);
    }

    pub fn set_failing(&self, failing: bool) {
        self.faults.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.faults.delay) = delay;
    }

    fn push(
        &self,
        family_id: i32,
        category_id: Option<i32>,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
    ) {
        lock(&self.entries).push(Entry {
            family_id,
            category_id,
            kind,
            amount,
            date,
        });
    }

    fn sum(&self, keep: impl Fn(&Entry) -> bool) -> Result<Decimal> {
        checked_total(lock(&self.entries).iter().filter(|e| keep(e)).map(|e| e.amount))
    }
}

#[async_trait]
impl LedgerQuery for MemoryLedger {
    async fn total_by_category_and_date_range(
        &self,
        category_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal> {
        self.faults.check("ledger").await?;
        self.sum(|e| {
            e.kind == kind && e.category_id == Some(category_id) && e.date >= start && e.date <= end
        })
    }

    async fn total_by_family_and_date_range(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal> {
        self.faults.check("ledger").await?;
        self.sum(|e| e.kind == kind && e.family_id == family_id && e.date >= start && e.date <= end)
    }

    async fn total_by_category(&self, category_id: i32, kind: TransactionKind) -> Result<Decimal> {
        self.faults.check("ledger").await?;
        self.sum(|e| e.kind == kind && e.category_id == Some(category_id))
    }
}
