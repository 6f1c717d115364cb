use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub party_id: i32,

    pub name: String,

    pub email: Option<String>,

    pub phone_no: Option<String>,

    pub customer_code: Option<String>,

    pub address: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub open_balance: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub credit_limit: Decimal,

    pub preferred_payment_method: Option<String>,

    pub loyalty_points: i32,

    pub referred_by: Option<String>,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parties::Entity",
        from = "Column::PartyId",
        to = "super::parties::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Party,
}

impl Related<super::parties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
