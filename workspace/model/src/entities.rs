//! Root for all SeaORM entity modules of the household budget store.

pub mod budget;
pub mod category;
pub mod ledger_transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::category::Entity as Category;
    pub use super::ledger_transaction::Entity as LedgerTransaction;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let groceries = category::ActiveModel {
            family_id: Set(1),
            name: Set("Groceries".to_string()),
            description: Set(Some("Food and household items".to_string())),
            parent_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let now = Utc::now();
        let budget = budget::ActiveModel {
            family_id: Set(1),
            name: Set("January groceries".to_string()),
            amount: Set(Decimal::new(50000, 2)),
            spent: Set(Decimal::ZERO),
            period: Set(budget::BudgetPeriod::Monthly),
            category_id: Set(Some(groceries.id)),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        ledger_transaction::ActiveModel {
            family_id: Set(1),
            category_id: Set(Some(groceries.id)),
            kind: Set(ledger_transaction::TransactionKind::Expense),
            amount: Set(Decimal::new(4250, 2)),
            date: Set(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            description: Set(Some("Weekly shop".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let budgets = Budget::find().all(&db).await?;
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].period, budget::BudgetPeriod::Monthly);
        assert_eq!(budgets[0].amount, Decimal::new(50000, 2));

        let related = Budget::find()
            .filter(budget::Column::CategoryId.eq(groceries.id))
            .all(&db)
            .await?;
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, budget.id);

        let expenses = groceries.find_related(LedgerTransaction).all(&db).await?;
        assert_eq!(expenses.len(), 1);

        let expenses = LedgerTransaction::find()
            .filter(ledger_transaction::Column::CategoryId.eq(groceries.id))
            .all(&db)
            .await?;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].kind, ledger_transaction::TransactionKind::Expense);

        let categories = Category::find().all(&db).await?;
        assert_eq!(categories.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_budget_category_is_a_plain_reference() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let now = Utc::now();
        let stored = budget::ActiveModel {
            family_id: Set(1),
            name: Set("Pets".to_string()),
            amount: Set(Decimal::new(12345, 2)),
            spent: Set(Decimal::ZERO),
            period: Set(budget::BudgetPeriod::Custom),
            category_id: Set(Some(42)),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert_eq!(stored.category_id, Some(42));
        assert_eq!(stored.amount, Decimal::new(12345, 2));
        assert!(Category::find().all(&db).await?.is_empty());

        Ok(())
    }
}
