use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{categories, products};

/// New-product payload, already validated at the API edge.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category_id: i32,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
}

/// Partial-update payload; absent fields keep their prior values.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub description: Option<String>,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        account_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<products::Model>, u64)> {
        let paginator = products::Entity::find()
            .filter(products::Column::AccountId.eq(account_id))
            .order_by_asc(products::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    /// Ownership is part of the lookup: a foreign product id reads as
    /// absent, never as someone else's row.
    pub async fn get(&self, account_id: i32, id: i32) -> Result<Option<products::Model>> {
        let row = products::Entity::find_by_id(id)
            .filter(products::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query product")?;

        Ok(row)
    }

    pub async fn name_exists(&self, account_id: i32, name: &str) -> Result<bool> {
        let count = products::Entity::find()
            .filter(products::Column::AccountId.eq(account_id))
            .filter(products::Column::Name.eq(name))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn category_exists(&self, category_id: i32) -> Result<bool> {
        let count = categories::Entity::find_by_id(category_id)
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn create(&self, account_id: i32, new: NewProduct) -> Result<products::Model> {
        let now = Utc::now();

        let row = products::ActiveModel {
            account_id: Set(account_id),
            name: Set(new.name),
            category_id: Set(new.category_id),
            image: Set(new.image),
            unit_price: Set(new.unit_price),
            quantity: Set(new.quantity),
            description: Set(new.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row)
    }

    pub async fn update(
        &self,
        existing: products::Model,
        patch: ProductPatch,
    ) -> Result<products::Model> {
        let mut active: products::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(image) = patch.image {
            active.image = Set(Some(image));
        }
        if let Some(unit_price) = patch.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());

        let row = active.update(&self.conn).await?;
        Ok(row)
    }

    pub async fn remove(&self, account_id: i32, id: i32) -> Result<bool> {
        let result = products::Entity::delete_many()
            .filter(products::Column::Id.eq(id))
            .filter(products::Column::AccountId.eq(account_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
