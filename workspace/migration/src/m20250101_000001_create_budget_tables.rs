use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(integer(Categories::FamilyId))
                    .col(string(Categories::Name))
                    .col(string_null(Categories::Description))
                    .col(integer_null(Categories::ParentId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_parent")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create ledger transactions table
        manager
            .create_table(
                Table::create()
                    .table(LedgerTransactions::Table)
                    .if_not_exists()
                    .col(pk_auto(LedgerTransactions::Id))
                    .col(integer(LedgerTransactions::FamilyId))
                    .col(integer_null(LedgerTransactions::CategoryId))
                    .col(string_len(LedgerTransactions::Kind, 10))
                    .col(decimal_len(LedgerTransactions::Amount, 16, 4))
                    .col(date(LedgerTransactions::Date))
                    .col(string_null(LedgerTransactions::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_transaction_category")
                            .from(LedgerTransactions::Table, LedgerTransactions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Aggregate queries filter by family or category and date
        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_transactions_family_date")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::FamilyId)
                    .col(LedgerTransactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_transactions_category_date")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::CategoryId)
                    .col(LedgerTransactions::Date)
                    .to_owned(),
            )
            .await?;

        // Create budgets table
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(pk_auto(Budgets::Id))
                    .col(integer(Budgets::FamilyId))
                    .col(string(Budgets::Name))
                    .col(decimal_len(Budgets::Amount, 16, 4))
                    .col(decimal_len(Budgets::Spent, 16, 4).default(0))
                    .col(string_len(Budgets::Period, 10))
                    .col(integer_null(Budgets::CategoryId))
                    .col(date(Budgets::StartDate))
                    .col(date(Budgets::EndDate))
                    .col(boolean(Budgets::IsActive).default(true))
                    .col(timestamp_with_time_zone(Budgets::CreatedAt))
                    .col(timestamp_with_time_zone(Budgets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Overlap validation looks budgets up by family and window
        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_family_window")
                    .table(Budgets::Table)
                    .col(Budgets::FamilyId)
                    .col(Budgets::StartDate)
                    .col(Budgets::EndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_category")
                    .table(Budgets::Table)
                    .col(Budgets::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    FamilyId,
    Name,
    Description,
    ParentId,
}

#[derive(DeriveIden)]
enum LedgerTransactions {
    Table,
    Id,
    FamilyId,
    CategoryId,
    Kind,
    Amount,
    Date,
    Description,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    FamilyId,
    Name,
    Amount,
    Spent,
    Period,
    CategoryId,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
