use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use khaata::config::Config;
use khaata::db::Store;
use khaata::entities::{invoice_items, invoices};
use khaata::state::SharedState;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
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

async fn create_product(app: &Router, token: &str, name: &str, unit_price: &str) -> i32 {
    let (status, body) = request(
        app,
        "POST",
        "/api/products/",
        Some(token),
        Some(serde_json::json!({
            "name": name,
            "category_id": 1,
            "unit_price": unit_price,
            "quantity": 100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_i64().unwrap() as i32
}

fn dec(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[tokio::test]
async fn empty_invoice_persists_nothing() {
    let (app, shared, token) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0001",
            "items": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("At least one"));

    let total = invoices::Entity::find().count(&shared.store.conn).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn totals_follow_lines_discount_and_tax() {
    let (app, _shared, token) = spawn_app().await;

    let widget = create_product(&app, &token, "Widget", "100.00").await;
    let gadget = create_product(&app, &token, "Gadget", "50.00").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0002",
            "status": "Pending",
            "discount": "10.00",
            "tax": "5.00",
            "items": [
                { "product_id": widget, "quantity": 2, "rate": "100.00" },
                { "product_id": gadget, "quantity": 1, "rate": "50.00" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let invoice = &body["data"]["invoice"];
    assert_eq!(dec(&invoice["sub_total"]), Decimal::from(250));
    assert_eq!(dec(&invoice["total_amount"]), Decimal::from(245));

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(dec(&items[0]["total_price"]), Decimal::from(200));
    // Percentages are stored on the line but not folded into totals.
    assert_eq!(dec(&items[0]["tax_percentage"]), Decimal::from(13));
}

#[tokio::test]
async fn adding_a_line_recomputes_totals() {
    let (app, _shared, token) = spawn_app().await;

    let widget = create_product(&app, &token, "Widget", "100.00").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0003",
            "items": [{ "product_id": widget, "quantity": 1, "rate": "100.00" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["invoice"]["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/billing/{id}/items"),
        Some(&token),
        Some(serde_json::json!({ "product_id": widget, "quantity": 3, "rate": "20.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, "GET", &format!("/api/billing/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"]["invoice"]["sub_total"]), Decimal::from(160));
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn header_update_leaves_totals_alone() {
    let (app, _shared, token) = spawn_app().await;

    let widget = create_product(&app, &token, "Widget", "100.00").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0004",
            "items": [{ "product_id": widget, "quantity": 2, "rate": "100.00" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["invoice"]["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/billing/{id}"),
        Some(&token),
        Some(serde_json::json!({ "status": "Paid", "notes": "settled in cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Paid");
    assert_eq!(dec(&body["data"]["sub_total"]), Decimal::from(200));
    assert_eq!(dec(&body["data"]["total_amount"]), Decimal::from(200));
}

#[tokio::test]
async fn unknown_product_fails_before_any_write() {
    let (app, shared, token) = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0005",
            "items": [{ "product_id": 4040, "quantity": 1, "rate": "10.00" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let total = invoices::Entity::find().count(&shared.store.conn).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn duplicate_invoice_number_conflicts() {
    let (app, _shared, token) = spawn_app().await;

    let widget = create_product(&app, &token, "Widget", "100.00").await;
    let invoice = serde_json::json!({
        "invoice_number": "INV-0006",
        "items": [{ "product_id": widget, "quantity": 1, "rate": "100.00" }]
    });

    let (status, _) = request(&app, "POST", "/api/billing/", Some(&token), Some(invoice.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = request(&app, "POST", "/api/billing/", Some(&token), Some(invoice)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_an_invoice_removes_its_lines() {
    let (app, shared, token) = spawn_app().await;

    let widget = create_product(&app, &token, "Widget", "100.00").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/billing/",
        Some(&token),
        Some(serde_json::json!({
            "invoice_number": "INV-0007",
            "items": [{ "product_id": widget, "quantity": 2, "rate": "100.00" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["invoice"]["id"].as_i64().unwrap();

    let (status, _) = request(&app, "DELETE", &format!("/api/billing/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let orphans = invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(id as i32))
        .count(&shared.store.conn)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}
