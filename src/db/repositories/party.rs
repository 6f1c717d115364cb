use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{customers, parties, supplier_infos, suppliers};
use crate::models::{CustomerFields, PartySpec, SupplierFields};

/// A party row together with whichever specialization it carries.
#[derive(Debug, Clone)]
pub struct PartyRecord {
    pub party: parties::Model,
    pub customer: Option<customers::Model>,
    pub supplier: Option<suppliers::Model>,
}

pub struct PartyRepository {
    conn: DatabaseConnection,
}

impl PartyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_customer_by_email(&self, email: &str) -> Result<Option<customers::Model>> {
        let row = customers::Entity::find()
            .filter(customers::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query customer by email")?;
        Ok(row)
    }

    pub async fn find_customer_by_phone(&self, phone_no: &str) -> Result<Option<customers::Model>> {
        let row = customers::Entity::find()
            .filter(customers::Column::PhoneNo.eq(phone_no))
            .one(&self.conn)
            .await
            .context("Failed to query customer by phone")?;
        Ok(row)
    }

    pub async fn find_customer_by_code(&self, code: &str) -> Result<Option<customers::Model>> {
        let row = customers::Entity::find()
            .filter(customers::Column::CustomerCode.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query customer by code")?;
        Ok(row)
    }

    pub async fn find_supplier_by_code(&self, code: &str) -> Result<Option<suppliers::Model>> {
        let row = suppliers::Entity::find()
            .filter(suppliers::Column::Code.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query supplier by code")?;
        Ok(row)
    }

    pub async fn find_supplier_by_name(&self, name: &str) -> Result<Option<suppliers::Model>> {
        let row = suppliers::Entity::find()
            .filter(suppliers::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query supplier by name")?;
        Ok(row)
    }

    /// Insert the party row and its specialization as one unit; neither
    /// survives without the other.
    pub async fn create(&self, spec: &PartySpec, is_active: bool) -> Result<PartyRecord> {
        let txn = self.conn.begin().await?;

        let party = parties::ActiveModel {
            category: Set(spec.category().as_str().to_string()),
            is_active: Set(is_active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let record = match spec {
            PartySpec::Customer(fields) => {
                let customer = customers::ActiveModel {
                    party_id: Set(party.id),
                    name: Set(fields.name.clone()),
                    email: Set(fields.email.clone()),
                    phone_no: Set(fields.phone_no.clone()),
                    customer_code: Set(fields.customer_code.clone()),
                    address: Set(fields.address.clone()),
                    open_balance: Set(fields.open_balance),
                    credit_limit: Set(fields.credit_limit),
                    preferred_payment_method: Set(fields.preferred_payment_method.clone()),
                    loyalty_points: Set(fields.loyalty_points),
                    referred_by: Set(fields.referred_by.clone()),
                    notes: Set(fields.notes.clone()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                PartyRecord {
                    party,
                    customer: Some(customer),
                    supplier: None,
                }
            }
            PartySpec::Supplier(fields) => {
                let supplier = suppliers::ActiveModel {
                    party_id: Set(party.id),
                    name: Set(fields.name.clone()),
                    code: Set(fields.code.clone()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                PartyRecord {
                    party,
                    customer: None,
                    supplier: Some(supplier),
                }
            }
        };

        txn.commit().await?;

        info!(
            "Created {} party {}",
            record.party.category, record.party.id
        );
        Ok(record)
    }

    pub async fn get(&self, id: i32) -> Result<Option<PartyRecord>> {
        let Some(party) = parties::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query party")?
        else {
            return Ok(None);
        };

        let customer = customers::Entity::find()
            .filter(customers::Column::PartyId.eq(id))
            .one(&self.conn)
            .await?;

        let supplier = suppliers::Entity::find()
            .filter(suppliers::Column::PartyId.eq(id))
            .one(&self.conn)
            .await?;

        Ok(Some(PartyRecord {
            party,
            customer,
            supplier,
        }))
    }

    pub async fn list(
        &self,
        category: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PartyRecord>, u64)> {
        let mut query = parties::Entity::find().order_by_asc(parties::Column::Id);
        if let Some(category) = category {
            query = query.filter(parties::Column::Category.eq(category));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut records = Vec::with_capacity(rows.len());
        for party in rows {
            let customer = customers::Entity::find()
                .filter(customers::Column::PartyId.eq(party.id))
                .one(&self.conn)
                .await?;
            let supplier = suppliers::Entity::find()
                .filter(suppliers::Column::PartyId.eq(party.id))
                .one(&self.conn)
                .await?;
            records.push(PartyRecord {
                party,
                customer,
                supplier,
            });
        }

        Ok((records, total))
    }

    pub async fn update_customer(&self, updated: customers::Model) -> Result<customers::Model> {
        let active = customers::ActiveModel::from(updated).reset_all();
        let saved = active.update(&self.conn).await?;
        self.touch_party(saved.party_id).await?;
        Ok(saved)
    }

    pub async fn update_supplier(&self, updated: suppliers::Model) -> Result<suppliers::Model> {
        let active = suppliers::ActiveModel::from(updated).reset_all();
        let saved = active.update(&self.conn).await?;
        self.touch_party(saved.party_id).await?;
        Ok(saved)
    }

    async fn touch_party(&self, party_id: i32) -> Result<()> {
        parties::Entity::update_many()
            .col_expr(
                parties::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(parties::Column::Id.eq(party_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn set_inactive(&self, party_id: i32) -> Result<()> {
        parties::Entity::update_many()
            .col_expr(
                parties::Column::IsActive,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(parties::Column::Id.eq(party_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Cascade delete: supplier infos, specialization, then the party
    /// itself, all in one transaction.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let supplier = suppliers::Entity::find()
            .filter(suppliers::Column::PartyId.eq(id))
            .one(&txn)
            .await?;

        if let Some(supplier) = &supplier {
            supplier_infos::Entity::delete_many()
                .filter(supplier_infos::Column::SupplierId.eq(supplier.id))
                .exec(&txn)
                .await?;
        }

        suppliers::Entity::delete_many()
            .filter(suppliers::Column::PartyId.eq(id))
            .exec(&txn)
            .await?;

        customers::Entity::delete_many()
            .filter(customers::Column::PartyId.eq(id))
            .exec(&txn)
            .await?;

        let result = parties::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed party with ID: {}", id);
        }
        Ok(removed)
    }

    pub async fn supplier_info_count(&self, supplier_id: i32) -> Result<u64> {
        let count = supplier_infos::Entity::find()
            .filter(supplier_infos::Column::SupplierId.eq(supplier_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}

/// Merge a partial update onto an existing customer: absent fields keep
/// their prior values.
#[must_use]
pub fn merge_customer(existing: customers::Model, patch: &CustomerPatch) -> customers::Model {
    customers::Model {
        name: patch.name.clone().unwrap_or(existing.name),
        email: patch.email.clone().or(existing.email),
        phone_no: patch.phone_no.clone().or(existing.phone_no),
        customer_code: patch.customer_code.clone().or(existing.customer_code),
        address: patch.address.clone().or(existing.address),
        open_balance: patch.open_balance.unwrap_or(existing.open_balance),
        credit_limit: patch.credit_limit.unwrap_or(existing.credit_limit),
        preferred_payment_method: patch
            .preferred_payment_method
            .clone()
            .or(existing.preferred_payment_method),
        loyalty_points: patch.loyalty_points.unwrap_or(existing.loyalty_points),
        referred_by: patch.referred_by.clone().or(existing.referred_by),
        notes: patch.notes.clone().or(existing.notes),
        ..existing
    }
}

/// Merge a partial update onto an existing supplier (name and code only).
#[must_use]
pub fn merge_supplier(existing: suppliers::Model, patch: &SupplierPatch) -> suppliers::Model {
    suppliers::Model {
        name: patch.name.clone().unwrap_or(existing.name),
        code: patch.code.clone().unwrap_or(existing.code),
        ..existing
    }
}

/// Partial-update payload for a customer specialization.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub customer_code: Option<String>,
    pub address: Option<String>,
    pub open_balance: Option<rust_decimal::Decimal>,
    pub credit_limit: Option<rust_decimal::Decimal>,
    pub preferred_payment_method: Option<String>,
    pub loyalty_points: Option<i32>,
    pub referred_by: Option<String>,
    pub notes: Option<String>,
}

/// Partial-update payload for a supplier specialization.
#[derive(Debug, Clone, Default)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl From<&CustomerFields> for CustomerPatch {
    fn from(fields: &CustomerFields) -> Self {
        Self {
            name: Some(fields.name.clone()),
            email: fields.email.clone(),
            phone_no: fields.phone_no.clone(),
            customer_code: fields.customer_code.clone(),
            address: fields.address.clone(),
            open_balance: Some(fields.open_balance),
            credit_limit: Some(fields.credit_limit),
            preferred_payment_method: fields.preferred_payment_method.clone(),
            loyalty_points: Some(fields.loyalty_points),
            referred_by: fields.referred_by.clone(),
            notes: fields.notes.clone(),
        }
    }
}

impl From<&SupplierFields> for SupplierPatch {
    fn from(fields: &SupplierFields) -> Self {
        Self {
            name: Some(fields.name.clone()),
            code: Some(fields.code.clone()),
        }
    }
}
