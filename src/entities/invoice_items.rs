use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One product line on an invoice. `total_price` is quantity × rate; the
/// percentage columns are recorded but not folded into the total.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub invoice_id: i32,

    pub product_id: i32,

    pub quantity: i32,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub rate: Decimal,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount_percentage: Decimal,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub tax_percentage: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Invoice,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
