use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::expenses;

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub is_necessary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_necessary: Option<bool>,
}

pub struct ExpenseRepository {
    conn: DatabaseConnection,
}

impl ExpenseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        account_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<expenses::Model>, u64)> {
        let paginator = expenses::Entity::find()
            .filter(expenses::Column::AccountId.eq(account_id))
            .order_by_asc(expenses::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    pub async fn get(&self, account_id: i32, id: i32) -> Result<Option<expenses::Model>> {
        let row = expenses::Entity::find_by_id(id)
            .filter(expenses::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query expense")?;

        Ok(row)
    }

    pub async fn create(&self, account_id: i32, new: NewExpense) -> Result<expenses::Model> {
        let row = expenses::ActiveModel {
            account_id: Set(account_id),
            category: Set(new.category),
            amount: Set(new.amount),
            description: Set(new.description),
            date: Set(new.date),
            is_necessary: Set(new.is_necessary),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row)
    }

    pub async fn update(
        &self,
        existing: expenses::Model,
        patch: ExpensePatch,
    ) -> Result<expenses::Model> {
        let mut active: expenses::ActiveModel = existing.into();

        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(amount) = patch.amount {
            active.amount = Set(amount);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(date) = patch.date {
            active.date = Set(date);
        }
        if let Some(is_necessary) = patch.is_necessary {
            active.is_necessary = Set(is_necessary);
        }

        let row = active.update(&self.conn).await?;
        Ok(row)
    }

    pub async fn remove(&self, account_id: i32, id: i32) -> Result<bool> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(id))
            .filter(expenses::Column::AccountId.eq(account_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
