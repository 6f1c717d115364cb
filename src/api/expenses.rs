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
use crate::db::{ExpensePatch, NewExpense};
use crate::entities::expenses;

#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_necessary: bool,
}

#[derive(Deserialize, Default)]
pub struct UpdateExpenseRequest {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_necessary: Option<bool>,
}

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<expenses::Model>>>, ApiError> {
    let (items, total) = state
        .store()
        .expenses()
        .list(account_id, query.page.max(1), PAGE_SIZE)
        .await?;

    Ok(Json(ApiResponse::success(Page::new(
        items,
        total,
        query.page.max(1),
        PAGE_SIZE,
    ))))
}

pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_expense_category(&req.category)?;
    if req.amount <= Decimal::ZERO {
        return Err(ApiError::validation("Amount must be greater than zero"));
    }

    let expense = state
        .store()
        .expenses()
        .create(
            account_id,
            NewExpense {
                category: req.category,
                amount: req.amount,
                description: req.description,
                date: req.date,
                is_necessary: req.is_necessary,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(expense))))
}

pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<expenses::Model>>, ApiError> {
    let id = validation::validate_id(id, "expense")?;

    let expense = state
        .store()
        .expenses()
        .get(account_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Expense", id))?;

    Ok(Json(ApiResponse::success(expense)))
}

pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ApiResponse<expenses::Model>>, ApiError> {
    let id = validation::validate_id(id, "expense")?;

    if let Some(category) = &req.category {
        validation::validate_expense_category(category)?;
    }
    if let Some(amount) = req.amount
        && amount <= Decimal::ZERO
    {
        return Err(ApiError::validation("Amount must be greater than zero"));
    }

    let existing = state
        .store()
        .expenses()
        .get(account_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Expense", id))?;

    let expense = state
        .store()
        .expenses()
        .update(
            existing,
            ExpensePatch {
                category: req.category,
                amount: req.amount,
                description: req.description,
                date: req.date,
                is_necessary: req.is_necessary,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(expense)))
}

pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_id(id, "expense")?;

    let removed = state.store().expenses().remove(account_id, id).await?;
    if !removed {
        return Err(ApiError::not_found("Expense", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Expense deleted successfully",
    ))))
}
