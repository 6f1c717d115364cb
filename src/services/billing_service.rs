//! Domain service for invoice creation and totals.
//!
//! Stored totals are always derived from the lines: `sub_total` is the
//! sum of line totals and `total_amount` is `sub_total - discount +
//! tax`. Header edits never touch them; adding a line recomputes them.

use serde::Serialize;
use thiserror::Error;

use crate::entities::{invoice_items, invoices};

/// Errors specific to billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("At least one billing item is required")]
    NoLines,

    #[error("An invoice with this number already exists")]
    DuplicateInvoiceNumber,

    #[error("Invoice not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for BillingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BillingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// An invoice header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: invoices::Model,
    pub items: Vec<invoice_items::Model>,
}

/// Domain service trait for billing.
#[async_trait::async_trait]
pub trait BillingService: Send + Sync {
    /// Creates an invoice with its lines and derives the totals.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::NoLines`] when no lines are given —
    /// nothing is written in that case.
    async fn create_invoice(
        &self,
        account_id: i32,
        header: crate::db::NewInvoice,
        lines: Vec<crate::db::NewInvoiceLine>,
    ) -> Result<InvoiceDetail, BillingError>;

    /// Appends one line to an existing invoice and refreshes totals.
    async fn add_line(
        &self,
        account_id: i32,
        invoice_id: i32,
        line: crate::db::NewInvoiceLine,
    ) -> Result<invoice_items::Model, BillingError>;

    async fn list(
        &self,
        account_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<invoices::Model>, u64), BillingError>;

    async fn get(&self, account_id: i32, id: i32) -> Result<InvoiceDetail, BillingError>;

    /// Partial header update. Totals stay as derived from the lines.
    async fn update(
        &self,
        account_id: i32,
        id: i32,
        patch: crate::db::InvoicePatch,
    ) -> Result<invoices::Model, BillingError>;

    async fn delete(&self, account_id: i32, id: i32) -> Result<(), BillingError>;
}
