use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AccountId;
use super::{ApiError, ApiResponse, AppState, MessageResponse, PAGE_SIZE, Page, PageQuery, validation};
use crate::db::{InvoicePatch, NewInvoice, NewInvoiceLine};
use crate::entities::{invoice_items, invoices};
use crate::services::InvoiceDetail;

#[derive(Deserialize)]
pub struct InvoiceLineRequest {
    pub product_id: i32,
    pub quantity: i32,
    pub rate: Decimal,
    pub discount_percentage: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
}

impl InvoiceLineRequest {
    fn into_line(self) -> NewInvoiceLine {
        NewInvoiceLine {
            product_id: self.product_id,
            quantity: self.quantity,
            rate: self.rate,
            discount_percentage: self.discount_percentage.unwrap_or(Decimal::ZERO),
            // Standard VAT rate unless the caller overrides it.
            tax_percentage: self.tax_percentage.unwrap_or_else(|| Decimal::from(13)),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub invoice_number: String,
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
    #[serde(default)]
    pub items: Vec<InvoiceLineRequest>,
}

#[derive(Deserialize, Default)]
pub struct UpdateInvoiceRequest {
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

pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<invoices::Model>>>, ApiError> {
    let page = query.page.max(1);
    let (items, total) = state.billing().list(account_id, page, PAGE_SIZE).await?;

    Ok(Json(ApiResponse::success(Page::new(
        items, total, page, PAGE_SIZE,
    ))))
}

pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match req.status {
        Some(status) => validation::validate_invoice_status(&status)?.to_string(),
        None => "Draft".to_string(),
    };

    let header = NewInvoice {
        invoice_number: req.invoice_number,
        invoice_date: req.invoice_date,
        due_date: req.due_date,
        payment_method: req.payment_method,
        status,
        party_id: req.party_id,
        phone: req.phone,
        vat_number: req.vat_number,
        address: req.address,
        notes: req.notes,
        paid_amount: req.paid_amount.unwrap_or_default(),
        due_amount: req.due_amount.unwrap_or_default(),
        discount: req.discount.unwrap_or_default(),
        tax: req.tax.unwrap_or_default(),
    };

    let lines = req
        .items
        .into_iter()
        .map(InvoiceLineRequest::into_line)
        .collect();

    let detail = state
        .billing()
        .create_invoice(account_id, header, lines)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<InvoiceDetail>>, ApiError> {
    let id = validation::validate_id(id, "invoice")?;

    let detail = state.billing().get(account_id, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateInvoiceRequest>,
) -> Result<Json<ApiResponse<invoices::Model>>, ApiError> {
    let id = validation::validate_id(id, "invoice")?;

    if let Some(status) = &req.status {
        validation::validate_invoice_status(status)?;
    }

    let patch = InvoicePatch {
        invoice_date: req.invoice_date,
        due_date: req.due_date,
        payment_method: req.payment_method,
        status: req.status,
        party_id: req.party_id,
        phone: req.phone,
        vat_number: req.vat_number,
        address: req.address,
        notes: req.notes,
        paid_amount: req.paid_amount,
        due_amount: req.due_amount,
        discount: req.discount,
        tax: req.tax,
    };

    let invoice = state.billing().update(account_id, id, patch).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id, "invoice")?;

    state.billing().delete(account_id, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Invoice deleted successfully",
    ))))
}

/// Append a line to an existing invoice; totals refresh in the same
/// transaction.
pub async fn add_invoice_item(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
    Json(req): Json<InvoiceLineRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validation::validate_id(id, "invoice")?;

    let item: invoice_items::Model = state
        .billing()
        .add_line(account_id, id, req.into_line())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}
