use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AccountId;
use super::{ApiError, ApiResponse, AppState, PAGE_SIZE, Page, PageQuery, validation};
use crate::db::{NewProduct, ProductPatch};
use crate::entities::products;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub category_id: i32,
    pub image: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    pub description: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub image: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub description: Option<String>,
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<products::Model>>>, ApiError> {
    let (items, total) = state
        .store()
        .products()
        .list(account_id, query.page.max(1), PAGE_SIZE)
        .await?;

    Ok(Json(ApiResponse::success(Page::new(
        items,
        total,
        query.page.max(1),
        PAGE_SIZE,
    ))))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("Product name is required"));
    }
    if req.quantity < 0 {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }
    if req.unit_price < Decimal::ZERO {
        return Err(ApiError::validation("Unit price cannot be negative"));
    }

    let products = state.store().products();

    if !products.category_exists(req.category_id).await? {
        return Err(ApiError::validation(format!(
            "Category {} does not exist",
            req.category_id
        )));
    }
    if products.name_exists(account_id, &req.name).await? {
        return Err(ApiError::conflict("A product with this name already exists"));
    }

    let product = products
        .create(
            account_id,
            NewProduct {
                name: req.name,
                category_id: req.category_id,
                image: req.image,
                unit_price: req.unit_price,
                quantity: req.quantity,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validation::validate_id(id, "product")?;

    let product = state
        .store()
        .products()
        .get(account_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(ApiResponse::success(product)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validation::validate_id(id, "product")?;

    if let Some(quantity) = req.quantity
        && quantity < 0
    {
        return Err(ApiError::validation("Quantity cannot be negative"));
    }
    if let Some(category_id) = req.category_id
        && !state.store().products().category_exists(category_id).await?
    {
        return Err(ApiError::validation(format!(
            "Category {} does not exist",
            category_id
        )));
    }

    let existing = state
        .store()
        .products()
        .get(account_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    if let Some(name) = &req.name
        && name != &existing.name
        && state.store().products().name_exists(account_id, name).await?
    {
        return Err(ApiError::conflict("A product with this name already exists"));
    }

    let product = state
        .store()
        .products()
        .update(
            existing,
            ProductPatch {
                name: req.name,
                category_id: req.category_id,
                image: req.image,
                unit_price: req.unit_price,
                quantity: req.quantity,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(AccountId(account_id)): Extension<AccountId>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<super::MessageResponse>>, ApiError> {
    let id = validation::validate_id(id, "product")?;

    let removed = state.store().products().remove(account_id, id).await?;
    if !removed {
        return Err(ApiError::not_found("Product", id));
    }

    Ok(Json(ApiResponse::success(super::MessageResponse::new(
        "Product deleted successfully",
    ))))
}
