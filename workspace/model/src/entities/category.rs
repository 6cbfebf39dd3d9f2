use sea_orm::entity::prelude::*;

/// An expense category of a household.
///
/// Budgets and ledger entries reference categories by id only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub family_id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Self-referencing foreign key for hierarchical categories.
    pub parent_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::ledger_transaction::Entity")]
    LedgerTransaction,
}

impl Related<super::ledger_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
