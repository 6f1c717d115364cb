//! `SeaORM` implementation of the `BillingService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{InvoicePatch, NewInvoice, NewInvoiceLine, Store};
use crate::entities::{invoice_items, invoices};
use crate::services::billing_service::{BillingError, BillingService, InvoiceDetail};

pub struct SeaOrmBillingService {
    store: Store,
}

impl SeaOrmBillingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// A line must point at one of the account's own products and
    /// carry a positive quantity.
    async fn validate_line(&self, account_id: i32, line: &NewInvoiceLine) -> Result<(), BillingError> {
        if line.quantity <= 0 {
            return Err(BillingError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let product = self.store.products().get(account_id, line.product_id).await?;
        if product.is_none() {
            return Err(BillingError::Validation(format!(
                "Product {} not found",
                line.product_id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl BillingService for SeaOrmBillingService {
    async fn create_invoice(
        &self,
        account_id: i32,
        header: NewInvoice,
        lines: Vec<NewInvoiceLine>,
    ) -> Result<InvoiceDetail, BillingError> {
        // All validation happens before the first write.
        if lines.is_empty() {
            return Err(BillingError::NoLines);
        }

        if header.invoice_number.trim().is_empty() {
            return Err(BillingError::Validation(
                "Invoice number is required".to_string(),
            ));
        }

        if self
            .store
            .invoices()
            .invoice_number_exists(&header.invoice_number)
            .await?
        {
            return Err(BillingError::DuplicateInvoiceNumber);
        }

        for line in &lines {
            self.validate_line(account_id, line).await?;
        }

        let (invoice, items) = self
            .store
            .invoices()
            .create_with_items(account_id, header, lines)
            .await?;

        Ok(InvoiceDetail { invoice, items })
    }

    async fn add_line(
        &self,
        account_id: i32,
        invoice_id: i32,
        line: NewInvoiceLine,
    ) -> Result<invoice_items::Model, BillingError> {
        self.validate_line(account_id, &line).await?;

        let item = self
            .store
            .invoices()
            .add_line(account_id, invoice_id, line)
            .await?
            .ok_or(BillingError::NotFound)?;

        Ok(item)
    }

    async fn list(
        &self,
        account_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<invoices::Model>, u64), BillingError> {
        let result = self.store.invoices().list(account_id, page, page_size).await?;
        Ok(result)
    }

    async fn get(&self, account_id: i32, id: i32) -> Result<InvoiceDetail, BillingError> {
        let invoice = self
            .store
            .invoices()
            .get(account_id, id)
            .await?
            .ok_or(BillingError::NotFound)?;

        let items = self.store.invoices().get_items(invoice.id).await?;

        Ok(InvoiceDetail { invoice, items })
    }

    async fn update(
        &self,
        account_id: i32,
        id: i32,
        patch: InvoicePatch,
    ) -> Result<invoices::Model, BillingError> {
        let existing = self
            .store
            .invoices()
            .get(account_id, id)
            .await?
            .ok_or(BillingError::NotFound)?;

        let updated = self.store.invoices().update(existing, patch).await?;
        Ok(updated)
    }

    async fn delete(&self, account_id: i32, id: i32) -> Result<(), BillingError> {
        let removed = self.store.invoices().remove(account_id, id).await?;
        if !removed {
            return Err(BillingError::NotFound);
        }
        info!("Deleted invoice {}", id);
        Ok(())
    }
}
