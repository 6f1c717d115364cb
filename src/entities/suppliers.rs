use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub party_id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub code: String,
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
    #[sea_orm(has_many = "super::supplier_infos::Entity")]
    SupplierInfos,
}

impl Related<super::parties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl Related<super::supplier_infos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierInfos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
