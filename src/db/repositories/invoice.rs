use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{invoice_items, invoices};
use crate::models::billing::{compute_totals, line_total};

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub status: String,
    pub party_id: Option<i32>,
    pub phone: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewInvoiceLine {
    pub product_id: i32,
    pub quantity: i32,
    pub rate: Decimal,
    pub discount_percentage: Decimal,
    pub tax_percentage: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct InvoicePatch {
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub party_id: Option<i32>,
    pub phone: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub due_amount: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
}

pub struct InvoiceRepository {
    conn: DatabaseConnection,
}

impl InvoiceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create the invoice header and all of its lines as one unit, then
    /// derive the stored totals. Nothing is observable until commit.
    pub async fn create_with_items(
        &self,
        account_id: i32,
        header: NewInvoice,
        lines: Vec<NewInvoiceLine>,
    ) -> Result<(invoices::Model, Vec<invoice_items::Model>)> {
        let txn = self.conn.begin().await?;

        let invoice = invoices::ActiveModel {
            account_id: Set(account_id),
            invoice_number: Set(header.invoice_number),
            invoice_date: Set(header.invoice_date),
            due_date: Set(header.due_date),
            payment_method: Set(header.payment_method),
            status: Set(header.status),
            party_id: Set(header.party_id),
            phone: Set(header.phone),
            vat_number: Set(header.vat_number),
            address: Set(header.address),
            notes: Set(header.notes),
            paid_amount: Set(header.paid_amount),
            due_amount: Set(header.due_amount),
            total_amount: Set(Decimal::ZERO),
            discount: Set(header.discount),
            tax: Set(header.tax),
            sub_total: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(insert_line(&txn, invoice.id, line).await?);
        }

        let invoice = recompute(&txn, invoice).await?;

        txn.commit().await?;

        info!(
            "Created invoice {} with {} lines",
            invoice.invoice_number,
            items.len()
        );
        Ok((invoice, items))
    }

    /// Record one more line on an existing invoice and fold it into the
    /// stored totals. The insert and the recompute share a transaction,
    /// so concurrent line additions serialize instead of losing updates.
    pub async fn add_line(
        &self,
        account_id: i32,
        invoice_id: i32,
        line: NewInvoiceLine,
    ) -> Result<Option<invoice_items::Model>> {
        let txn = self.conn.begin().await?;

        let Some(invoice) = invoices::Entity::find_by_id(invoice_id)
            .filter(invoices::Column::AccountId.eq(account_id))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let item = insert_line(&txn, invoice.id, line).await?;
        recompute(&txn, invoice).await?;

        txn.commit().await?;

        Ok(Some(item))
    }

    pub async fn list(
        &self,
        account_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<invoices::Model>, u64)> {
        let paginator = invoices::Entity::find()
            .filter(invoices::Column::AccountId.eq(account_id))
            .order_by_asc(invoices::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((rows, total))
    }

    pub async fn get(&self, account_id: i32, id: i32) -> Result<Option<invoices::Model>> {
        let row = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query invoice")?;

        Ok(row)
    }

    pub async fn get_items(&self, invoice_id: i32) -> Result<Vec<invoice_items::Model>> {
        let rows = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_items::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool> {
        let count = invoices::Entity::find()
            .filter(invoices::Column::InvoiceNumber.eq(invoice_number))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Partial header update. Line totals are the only recompute
    /// trigger, so this deliberately leaves the stored totals alone.
    pub async fn update(
        &self,
        existing: invoices::Model,
        patch: InvoicePatch,
    ) -> Result<invoices::Model> {
        let mut active: invoices::ActiveModel = existing.into();

        if let Some(invoice_date) = patch.invoice_date {
            active.invoice_date = Set(Some(invoice_date));
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(Some(due_date));
        }
        if let Some(payment_method) = patch.payment_method {
            active.payment_method = Set(Some(payment_method));
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(party_id) = patch.party_id {
            active.party_id = Set(Some(party_id));
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(vat_number) = patch.vat_number {
            active.vat_number = Set(Some(vat_number));
        }
        if let Some(address) = patch.address {
            active.address = Set(Some(address));
        }
        if let Some(notes) = patch.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(paid_amount) = patch.paid_amount {
            active.paid_amount = Set(paid_amount);
        }
        if let Some(due_amount) = patch.due_amount {
            active.due_amount = Set(due_amount);
        }
        if let Some(discount) = patch.discount {
            active.discount = Set(discount);
        }
        if let Some(tax) = patch.tax {
            active.tax = Set(tax);
        }

        let row = active.update(&self.conn).await?;
        Ok(row)
    }

    /// Cascade delete of the header and its lines.
    pub async fn remove(&self, account_id: i32, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(invoice) = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::AccountId.eq(account_id))
            .one(&txn)
            .await?
        else {
            return Ok(false);
        };

        invoice_items::Entity::delete_many()
            .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
            .exec(&txn)
            .await?;

        invoices::Entity::delete_by_id(invoice.id).exec(&txn).await?;

        txn.commit().await?;

        Ok(true)
    }
}

async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i32,
    line: NewInvoiceLine,
) -> Result<invoice_items::Model> {
    let total_price = line_total(line.quantity, line.rate);

    let item = invoice_items::ActiveModel {
        invoice_id: Set(invoice_id),
        product_id: Set(line.product_id),
        quantity: Set(line.quantity),
        rate: Set(line.rate),
        discount_percentage: Set(line.discount_percentage),
        tax_percentage: Set(line.tax_percentage),
        total_price: Set(total_price),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(item)
}

/// Re-derive `sub_total` and `total_amount` from the stored lines.
/// Idempotent: unchanged lines produce unchanged totals.
async fn recompute<C: ConnectionTrait>(
    conn: &C,
    invoice: invoices::Model,
) -> Result<invoices::Model> {
    let line_totals: Vec<Decimal> = invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| item.total_price)
        .collect();

    let totals = compute_totals(line_totals, invoice.discount, invoice.tax);

    let mut active: invoices::ActiveModel = invoice.into();
    active.sub_total = Set(totals.sub_total);
    active.total_amount = Set(totals.total_amount);

    let updated = active.update(conn).await?;
    Ok(updated)
}
