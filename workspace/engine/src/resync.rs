//! Read-repair of the cached `spent` amount.
//!
//! Every read path recomputes a budget's spent total from the ledger and
//! writes it back when it drifted. Failures on the read paths are reported to
//! a [`RecalcObserver`] and the cached value is used instead.

use chrono::Utc;
use model::entities::ledger_transaction::TransactionKind;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{EngineError, Result};
use crate::store::{with_deadline, Budget, BudgetStore, LedgerQuery};

/// Receives recalculation failures that were recovered locally.
pub trait RecalcObserver: Send + Sync {
    fn recalculation_failed(&self, operation: &'static str, budget_id: i32, error: &EngineError);
}

/// Default observer: one structured warning per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RecalcObserver for TracingObserver {
    fn recalculation_failed(&self, operation: &'static str, budget_id: i32, error: &EngineError) {
        warn!(
            operation,
            budget_id,
            error = %error,
            "Failed to recalculate budget spent amount, using cached value"
        );
    }
}

/// Outcome of a strict recalculation.
#[derive(Debug, Clone)]
pub struct Resynced {
    pub budget: Budget,
    /// Whether the stored record was rewritten.
    pub changed: bool,
}

pub struct SpentRecalculator {
    budgets: Arc<dyn BudgetStore>,
    ledger: Arc<dyn LedgerQuery>,
    observer: Arc<dyn RecalcObserver>,
    call_timeout: Option<Duration>,
}

impl SpentRecalculator {
    pub fn new(
        budgets: Arc<dyn BudgetStore>,
        ledger: Arc<dyn LedgerQuery>,
        observer: Arc<dyn RecalcObserver>,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            budgets,
            ledger,
            observer,
            call_timeout,
        }
    }

    /// Sum of the ledger expenses matching the budget's scope and window.
    pub async fn ledger_spent(&self, budget: &Budget) -> Result<Decimal> {
        match budget.category_id {
            Some(category_id) => {
                with_deadline(
                    "total_by_category_and_date_range",
                    self.call_timeout,
                    self.ledger.total_by_category_and_date_range(
                        category_id,
                        budget.start_date,
                        budget.end_date,
                        TransactionKind::Expense,
                    ),
                )
                .await
            }
            None => {
                with_deadline(
                    "total_by_family_and_date_range",
                    self.call_timeout,
                    self.ledger.total_by_family_and_date_range(
                        budget.family_id,
                        budget.start_date,
                        budget.end_date,
                        TransactionKind::Expense,
                    ),
                )
                .await
            }
        }
    }

    /// Recomputes `spent` and persists it when it differs from the cache.
    #[instrument(skip(self, budget), fields(budget_id = budget.id))]
    pub async fn resync_strict(&self, operation: &'static str, budget: Budget) -> Result<Resynced> {
        let spent = self
            .ledger_spent(&budget)
            .await
            .map_err(|e| e.in_calculation(operation))?;

        if spent == budget.spent {
            debug!(%spent, "Budget spent amount is current");
            return Ok(Resynced {
                budget,
                changed: false,
            });
        }

        debug!(cached = %budget.spent, %spent, "Budget spent amount drifted, rewriting");
        let mut fresh = budget;
        fresh.spent = spent;
        fresh.updated_at = Utc::now();

        let stored = with_deadline("update", self.call_timeout, self.budgets.update(&fresh))
            .await
            .map_err(|e| e.in_calculation(operation))?;

        Ok(Resynced {
            budget: stored,
            changed: true,
        })
    }

    /// Best-effort variant used by read paths.
    pub async fn resync(&self, operation: &'static str, budget: Budget) -> Budget {
        let budget_id = budget.id;
        let cached = budget.clone();
        match self.resync_strict(operation, budget).await {
            Ok(resynced) => resynced.budget,
            Err(e) => {
                self.observer.recalculation_failed(operation, budget_id, &e);
                cached
            }
        }
    }

    pub async fn resync_all(&self, operation: &'static str, budgets: Vec<Budget>) -> Vec<Budget> {
        let mut fresh = Vec::with_capacity(budgets.len());
        for budget in budgets {
            fresh.push(self.resync(operation, budget).await);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::{MemoryBudgetStore, MemoryLedger};
    use crate::testing::{budget, d, CollectingObserver};

    struct Fixture {
        store: Arc<MemoryBudgetStore>,
        ledger: Arc<MemoryLedger>,
        observer: Arc<CollectingObserver>,
        recalculator: SpentRecalculator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryBudgetStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let observer = Arc::new(CollectingObserver::default());
        let recalculator = SpentRecalculator::new(
            store.clone(),
            ledger.clone(),
            observer.clone(),
            Some(Duration::from_millis(200)),
        );
        Fixture {
            store,
            ledger,
            observer,
            recalculator,
        }
    }

    #[tokio::test]
    async fn test_category_budget_sums_only_its_category_and_window() {
        let f = fixture();
        let stored = f
            .store
            .create(budget(0, "Food", Some(3), Decimal::new(500, 0), d(2024, 1, 1), d(2024, 1, 31)))
            .await
            .unwrap();

        f.ledger.add_expense(1, Some(3), Decimal::new(12050, 2), d(2024, 1, 1));
        f.ledger.add_expense(1, Some(3), Decimal::new(7925, 2), d(2024, 1, 31));
        f.ledger.add_expense(1, Some(4), Decimal::new(1000, 2), d(2024, 1, 10));
        f.ledger.add_expense(1, Some(3), Decimal::new(5000, 2), d(2024, 2, 1));
        f.ledger.add_income(1, Some(3), Decimal::new(90000, 2), d(2024, 1, 15));

        let resynced = f.recalculator.resync_strict("test", stored).await.unwrap();

        assert!(resynced.changed);
        assert!((resynced.budget.spent - Decimal::new(19975, 2)).abs() <= Decimal::new(1, 2));
        assert_eq!(f.store.get_by_id(resynced.budget.id).await.unwrap().unwrap().spent, resynced.budget.spent);
    }

    #[tokio::test]
    async fn test_family_budget_sums_every_category() {
        let f = fixture();
        let stored = f
            .store
            .create(budget(0, "Household", None, Decimal::new(1000, 0), d(2024, 1, 1), d(2024, 1, 31)))
            .await
            .unwrap();

        f.ledger.add_expense(1, Some(3), Decimal::new(100, 0), d(2024, 1, 2));
        f.ledger.add_expense(1, None, Decimal::new(50, 0), d(2024, 1, 3));
        f.ledger.add_expense(2, Some(3), Decimal::new(999, 0), d(2024, 1, 3));

        let resynced = f.recalculator.resync_strict("test", stored).await.unwrap();
        assert_eq!(resynced.budget.spent, Decimal::new(150, 0));
    }

    #[tokio::test]
    async fn test_second_resync_does_not_write() {
        let f = fixture();
        let stored = f
            .store
            .create(budget(0, "Household", None, Decimal::new(1000, 0), d(2024, 1, 1), d(2024, 1, 31)))
            .await
            .unwrap();
        f.ledger.add_expense(1, None, Decimal::new(80, 0), d(2024, 1, 3));

        let first = f.recalculator.resync_strict("test", stored).await.unwrap();
        let writes_after_first = f.store.write_count();
        let second = f.recalculator.resync_strict("test", first.budget.clone()).await.unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(first.budget.spent, second.budget.spent);
        assert_eq!(f.store.write_count(), writes_after_first);
    }

    #[tokio::test]
    async fn test_best_effort_resync_keeps_cached_value_and_reports() {
        let f = fixture();
        let mut stored = f
            .store
            .create(budget(0, "Household", None, Decimal::new(1000, 0), d(2024, 1, 1), d(2024, 1, 31)))
            .await
            .unwrap();
        stored.spent = Decimal::new(42, 0);
        f.ledger.set_failing(true);

        let result = f.recalculator.resync("get_budget_by_id", stored).await;

        assert_eq!(result.spent, Decimal::new(42, 0));
        let events = f.observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, "get_budget_by_id");
        assert_eq!(events[0].budget_id, result.id);
        assert_eq!(events[0].kind, ErrorKind::CalculationFailed);
    }

    #[tokio::test]
    async fn test_slow_ledger_is_reported_as_deadline() {
        let f = fixture();
        let stored = f
            .store
            .create(budget(0, "Household", None, Decimal::new(1000, 0), d(2024, 1, 1), d(2024, 1, 31)))
            .await
            .unwrap();
        f.ledger.set_delay(Some(Duration::from_secs(2)));

        let err = f.recalculator.resync_strict("recalculate", stored).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }
}
