use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Invoice header. `sub_total` and `total_amount` are derived by the
/// billing service; the rest of the amount columns are caller-provided.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_id: i32,

    #[sea_orm(unique)]
    pub invoice_number: String,

    pub invoice_date: Option<Date>,

    pub due_date: Option<Date>,

    pub payment_method: Option<String>,

    /// Paid | Unpaid | Pending | Draft
    pub status: String,

    pub party_id: Option<i32>,

    pub phone: Option<String>,

    pub vat_number: Option<String>,

    pub address: Option<String>,

    pub notes: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub paid_amount: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub due_amount: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sub_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::parties::Entity",
        from = "Column::PartyId",
        to = "super::parties::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Party,
    #[sea_orm(has_many = "super::invoice_items::Entity")]
    Items,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::parties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl Related<super::invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
