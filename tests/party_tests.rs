use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use khaata::config::Config;
use khaata::db::Store;
use khaata::entities::{parties, supplier_infos};
use khaata::state::SharedState;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<SharedState>, String) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .expect("Failed to open store");

    let shared = Arc::new(SharedState::with_store(config, store).expect("Failed to build state"));
    let app = khaata::api::router(khaata::api::create_app_state(shared.clone()));
    let token = authenticate(&app, &shared).await;
    (app, shared, token)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn authenticate(app: &Router, shared: &SharedState) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/api/signup/",
        None,
        Some(serde_json::json!({
            "username": "owner",
            "email": "owner@example.com",
            "password": "correct-horse-9"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let otp = pending_otp(shared).await;
    let (status, _) = request(
        app,
        "POST",
        "/api/verify-signup-otp/",
        None,
        Some(serde_json::json!({ "email": "owner@example.com", "otp": otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        app,
        "POST",
        "/api/login/",
        None,
        Some(serde_json::json!({ "email": "owner@example.com", "password": "correct-horse-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let otp = pending_otp(shared).await;
    let (status, body) = request(
        app,
        "POST",
        "/api/verify-login-otp/",
        None,
        Some(serde_json::json!({ "email": "owner@example.com", "otp": otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["data"]["access"].as_str().unwrap().to_string()
}

async fn pending_otp(shared: &SharedState) -> String {
    let account = shared
        .store
        .accounts()
        .get_by_email("owner@example.com")
        .await
        .unwrap()
        .unwrap();
    shared
        .store
        .accounts()
        .get_profile(account.id)
        .await
        .unwrap()
        .unwrap()
        .otp
        .expect("no pending OTP")
}

fn customer_body(name: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "category": "Customer",
        "name": name,
        "email": email,
        "phone_no": format!("98{}", email.len()),
        "open_balance": "150.00",
        "loyalty_points": 5
    })
}

#[tokio::test]
async fn duplicate_customer_email_conflicts_without_a_new_row() {
    let (app, shared, token) = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/parties/",
        Some(&token),
        Some(customer_body("Asha", "asha@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &app,
        "POST",
        "/api/parties/",
        Some(&token),
        Some(serde_json::json!({
            "category": "Customer",
            "name": "Someone Else",
            "email": "asha@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["existing"]["name"], "Asha");

    let total = parties::Entity::find().count(&shared.store.conn).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn invalid_category_is_rejected() {
    let (app, _shared, token) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/parties/",
        Some(&token),
        Some(serde_json::json!({ "category": "Vendor", "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid category"));
}

#[tokio::test]
async fn partial_update_keeps_absent_fields() {
    let (app, _shared, token) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/parties/",
        Some(&token),
        Some(customer_body("Asha", "asha@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/parties/{id}"),
        Some(&token),
        Some(serde_json::json!({ "phone_no": "9811111111" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"]["phone_no"], "9811111111");
    assert_eq!(body["data"]["customer"]["name"], "Asha");
    assert_eq!(body["data"]["customer"]["email"], "asha@example.com");
    assert_eq!(body["data"]["customer"]["loyalty_points"], 5);
}

#[tokio::test]
async fn deleting_a_supplier_removes_its_infos() {
    let (app, shared, token) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/parties/",
        Some(&token),
        Some(serde_json::json!({
            "category": "Supplier",
            "name": "Acme Traders",
            "code": "SUP-001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let party_id = body["data"]["id"].as_i64().unwrap() as i32;
    let supplier_id = body["data"]["supplier"]["id"].as_i64().unwrap() as i32;

    supplier_infos::ActiveModel {
        supplier_id: Set(supplier_id),
        phone_no: Set(Some("9800000099".to_string())),
        open_balance: Set(rust_decimal::Decimal::ZERO),
        credit_limit: Set(rust_decimal::Decimal::ZERO),
        ..Default::default()
    }
    .insert(&shared.store.conn)
    .await
    .unwrap();

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/parties/{party_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let infos = supplier_infos::Entity::find()
        .filter(supplier_infos::Column::SupplierId.eq(supplier_id))
        .count(&shared.store.conn)
        .await
        .unwrap();
    assert_eq!(infos, 0);

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/parties/{party_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_category() {
    let (app, _shared, token) = spawn_app().await;

    for body in [
        customer_body("Asha", "asha@example.com"),
        serde_json::json!({ "category": "Supplier", "name": "Acme", "code": "SUP-9" }),
    ] {
        let (status, _) = request(&app, "POST", "/api/parties/", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(
        &app,
        "GET",
        "/api/parties/?category=Supplier",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["category"], "Supplier");
}

#[tokio::test]
async fn stale_orphan_party_is_demoted_on_update() {
    let (app, shared, token) = spawn_app().await;

    // A header with no specialization, idle past the 90-day window.
    let orphan = parties::ActiveModel {
        category: Set("Customer".to_string()),
        is_active: Set(true),
        updated_at: Set(Utc::now() - Duration::days(91)),
        ..Default::default()
    }
    .insert(&shared.store.conn)
    .await
    .unwrap();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/parties/{}", orphan.id),
        Some(&token),
        Some(serde_json::json!({ "name": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No customer or supplier"));

    let row = parties::Entity::find_by_id(orphan.id)
        .one(&shared.store.conn)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.is_active);
}
