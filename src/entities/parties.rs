use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Generic counterparty. Exactly one specialization row (customer or
/// supplier) exists per party, matching `category`; the party service
/// keeps the pair in sync.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// "Customer" or "Supplier"
    pub category: String,

    pub is_active: bool,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::customers::Entity")]
    Customer,
    #[sea_orm(has_one = "super::suppliers::Entity")]
    Supplier,
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
