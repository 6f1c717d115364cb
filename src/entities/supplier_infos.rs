use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Contact/banking detail records, zero-or-more per supplier.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "supplier_infos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub supplier_id: i32,

    pub phone_no: Option<String>,

    pub email: Option<String>,

    pub address: Option<String>,

    pub pan_number: Option<String>,

    pub bank_name: Option<String>,

    pub account_number: Option<String>,

    pub ifsc_code: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub open_balance: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub credit_limit: Decimal,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Supplier,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
