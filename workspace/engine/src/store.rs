//! Collaborator contracts the engine depends on.
//!
//! The engine never talks to a database directly; it only sees a
//! [`BudgetStore`] for budget records and a [`LedgerQuery`] for expense
//! aggregates. See [`crate::sea`] and [`crate::memory`] for implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::{budget, ledger_transaction::TransactionKind};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

use crate::error::{EngineError, Result};

pub type Budget = budget::Model;

/// Persistence of budget records.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Inserts a budget. The incoming `id` is ignored and the stored record,
    /// with its assigned id, is returned.
    async fn create(&self, budget: Budget) -> Result<Budget>;

    async fn get_by_id(&self, id: i32) -> Result<Option<Budget>>;

    /// Every budget of a family.
    async fn get_all(&self, family_id: i32) -> Result<Vec<Budget>>;

    /// Budgets of a family flagged active, regardless of their window.
    async fn get_active_budgets(&self, family_id: i32) -> Result<Vec<Budget>>;

    async fn get_by_category(&self, family_id: i32, category_id: i32) -> Result<Vec<Budget>>;

    /// Budgets of a family whose inclusive window intersects `[start, end]`.
    async fn get_by_period(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Budget>>;

    /// Replaces every field of the stored record with the given budget.
    async fn update(&self, budget: &Budget) -> Result<Budget>;

    /// Hard delete. Returns [`EngineError::NotFound`] when nothing was removed.
    async fn delete(&self, id: i32) -> Result<()>;
}

/// Aggregates over the household transaction ledger.
///
/// Every method returns zero, not an error, when no transaction matches.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    async fn total_by_category_and_date_range(
        &self,
        category_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal>;

    async fn total_by_family_and_date_range(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal>;

    /// All-time total of a category.
    async fn total_by_category(&self, category_id: i32, kind: TransactionKind) -> Result<Decimal>;
}

/// Sums ledger amounts, failing instead of wrapping past the decimal range.
pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or(EngineError::Overflow { operation: "ledger_sum" })
}

/// Runs a collaborator call under an optional deadline.
pub(crate) async fn with_deadline<T, F>(
    operation: &'static str,
    limit: Option<Duration>,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::DeadlineExceeded { operation }),
        },
        None => call.await,
    }
}
