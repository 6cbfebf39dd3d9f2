//! SeaORM backed implementations of [`BudgetStore`] and [`LedgerQuery`].

use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::{budget, ledger_transaction, ledger_transaction::TransactionKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, Unchanged,
};
use tracing::{debug, instrument, trace};

use crate::error::{EngineError, Result};
use crate::store::{checked_total, Budget, BudgetStore, LedgerQuery};

#[derive(Debug, Clone)]
pub struct SeaBudgetStore {
    db: DatabaseConnection,
}

impl SeaBudgetStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn family(family_id: i32) -> Select<budget::Entity> {
        budget::Entity::find()
            .filter(budget::Column::FamilyId.eq(family_id))
            .order_by_asc(budget::Column::StartDate)
            .order_by_asc(budget::Column::Id)
    }
}

#[async_trait]
impl BudgetStore for SeaBudgetStore {
    #[instrument(skip(self, budget), fields(family_id = budget.family_id))]
    async fn create(&self, budget: Budget) -> Result<Budget> {
        let model = budget::ActiveModel {
            id: NotSet,
            family_id: Set(budget.family_id),
            name: Set(budget.name),
            amount: Set(budget.amount),
            spent: Set(budget.spent),
            period: Set(budget.period),
            category_id: Set(budget.category_id),
            start_date: Set(budget.start_date),
            end_date: Set(budget.end_date),
            is_active: Set(budget.is_active),
            created_at: Set(budget.created_at),
            updated_at: Set(budget.updated_at),
        };
        let stored = model.insert(&self.db).await?;
        debug!(budget_id = stored.id, "Inserted budget");
        Ok(stored)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Budget>> {
        Ok(budget::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn get_all(&self, family_id: i32) -> Result<Vec<Budget>> {
        Ok(Self::family(family_id).all(&self.db).await?)
    }

    async fn get_active_budgets(&self, family_id: i32) -> Result<Vec<Budget>> {
        Ok(Self::family(family_id)
            .filter(budget::Column::IsActive.eq(true))
            .all(&self.db)
            .await?)
    }

    async fn get_by_category(&self, family_id: i32, category_id: i32) -> Result<Vec<Budget>> {
        Ok(Self::family(family_id)
            .filter(budget::Column::CategoryId.eq(category_id))
            .all(&self.db)
            .await?)
    }

    #[instrument(skip(self))]
    async fn get_by_period(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Budget>> {
        let budgets = Self::family(family_id)
            .filter(
                Condition::all()
                    .add(budget::Column::StartDate.lte(end))
                    .add(budget::Column::EndDate.gte(start)),
            )
            .all(&self.db)
            .await?;
        trace!(count = budgets.len(), "Budgets intersecting window");
        Ok(budgets)
    }

    #[instrument(skip(self, budget), fields(budget_id = budget.id))]
    async fn update(&self, budget: &Budget) -> Result<Budget> {
        let model = budget::ActiveModel {
            id: Unchanged(budget.id),
            family_id: Set(budget.family_id),
            name: Set(budget.name.clone()),
            amount: Set(budget.amount),
            spent: Set(budget.spent),
            period: Set(budget.period),
            category_id: Set(budget.category_id),
            start_date: Set(budget.start_date),
            end_date: Set(budget.end_date),
            is_active: Set(budget.is_active),
            created_at: Set(budget.created_at),
            updated_at: Set(budget.updated_at),
        };
        match model.update(&self.db).await {
            Ok(stored) => Ok(stored),
            Err(DbErr::RecordNotUpdated) => Err(EngineError::NotFound(budget.id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let result = budget::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound(id));
        }
        Ok(())
    }
}

/// Ledger aggregates over the `ledger_transactions` table.
#[derive(Debug, Clone)]
pub struct SeaLedger {
    db: DatabaseConnection,
}

impl SeaLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Amounts are summed in Rust so the result keeps full decimal precision
    /// on every backend. SQLite has no decimal type and its `SUM` returns a
    /// float, which would round fractional cents.
    async fn sum(&self, condition: Condition) -> Result<Decimal> {
        let amounts: Vec<Decimal> = ledger_transaction::Entity::find()
            .select_only()
            .column(ledger_transaction::Column::Amount)
            .filter(condition)
            .into_tuple()
            .all(&self.db)
            .await?;
        trace!(rows = amounts.len(), "Summing ledger amounts");
        checked_total(amounts)
    }
}

fn in_window(kind: TransactionKind, start: NaiveDate, end: NaiveDate) -> Condition {
    Condition::all()
        .add(ledger_transaction::Column::Kind.eq(kind))
        .add(ledger_transaction::Column::Date.gte(start))
        .add(ledger_transaction::Column::Date.lte(end))
}

#[async_trait]
impl LedgerQuery for SeaLedger {
    #[instrument(skip(self))]
    async fn total_by_category_and_date_range(
        &self,
        category_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal> {
        self.sum(in_window(kind, start, end).add(ledger_transaction::Column::CategoryId.eq(category_id)))
            .await
    }

    #[instrument(skip(self))]
    async fn total_by_family_and_date_range(
        &self,
        family_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Decimal> {
        self.sum(in_window(kind, start, end).add(ledger_transaction::Column::FamilyId.eq(family_id)))
            .await
    }

    #[instrument(skip(self))]
    async fn total_by_category(&self, category_id: i32, kind: TransactionKind) -> Result<Decimal> {
        self.sum(
            Condition::all()
                .add(ledger_transaction::Column::Kind.eq(kind))
                .add(ledger_transaction::Column::CategoryId.eq(category_id)),
        )
        .await
    }
}
