use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, PAGE_SIZE, Page, validation};
use crate::db::PartyRecord;
use crate::entities::{customers, suppliers};
use crate::services::PartyDraft;

#[derive(Deserialize, Default)]
pub struct PartyRequest {
    pub category: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub customer_code: Option<String>,
    pub address: Option<String>,
    pub open_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub preferred_payment_method: Option<String>,
    pub loyalty_points: Option<i32>,
    pub referred_by: Option<String>,
    pub notes: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

impl PartyRequest {
    fn into_draft(self) -> PartyDraft {
        PartyDraft {
            name: self.name,
            email: self.email,
            phone_no: self.phone_no,
            customer_code: self.customer_code,
            address: self.address,
            open_balance: self.open_balance,
            credit_limit: self.credit_limit,
            preferred_payment_method: self.preferred_payment_method,
            loyalty_points: self.loyalty_points,
            referred_by: self.referred_by,
            notes: self.notes,
            code: self.code,
            is_active: self.is_active,
        }
    }
}

#[derive(Deserialize)]
pub struct PartyListQuery {
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

/// A party with whichever specialization it carries.
#[derive(Debug, Serialize)]
pub struct PartyDto {
    pub id: i32,
    pub category: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub customer: Option<customers::Model>,
    pub supplier: Option<suppliers::Model>,
}

impl From<PartyRecord> for PartyDto {
    fn from(record: PartyRecord) -> Self {
        Self {
            id: record.party.id,
            category: record.party.category,
            is_active: record.party.is_active,
            updated_at: record.party.updated_at,
            customer: record.customer,
            supplier: record.supplier,
        }
    }
}

pub async fn list_parties(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PartyListQuery>,
) -> Result<Json<ApiResponse<Page<PartyDto>>>, ApiError> {
    let page = query.page.max(1);
    let (records, total) = state
        .parties()
        .list(query.category.as_deref(), page, PAGE_SIZE)
        .await?;

    let items = records.into_iter().map(PartyDto::from).collect();
    Ok(Json(ApiResponse::success(Page::new(
        items, total, page, PAGE_SIZE,
    ))))
}

pub async fn create_party(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PartyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = req
        .category
        .clone()
        .ok_or_else(|| ApiError::validation("Category is required"))?;

    let record = state.parties().create(&category, req.into_draft()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PartyDto::from(record))),
    ))
}

pub async fn get_party(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PartyDto>>, ApiError> {
    let id = validation::validate_id(id, "party")?;

    let record = state.parties().get(id).await?;
    Ok(Json(ApiResponse::success(PartyDto::from(record))))
}

pub async fn update_party(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<PartyRequest>,
) -> Result<Json<ApiResponse<PartyDto>>, ApiError> {
    let id = validation::validate_id(id, "party")?;

    let record = state.parties().update(id, req.into_draft()).await?;
    Ok(Json(ApiResponse::success(PartyDto::from(record))))
}

pub async fn delete_party(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id, "party")?;

    state.parties().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Party deleted successfully",
    ))))
}
