use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use khaata::config::Config;
use khaata::db::Store;
use khaata::state::SharedState;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<SharedState>) {
    spawn_app_with(Config::default()).await
}

async fn spawn_app_with(mut config: Config) -> (Router, Arc<SharedState>) {
    config.general.database_path = "sqlite::memory:".to_string();

    // One connection keeps the in-memory database shared.
    let store = Store::with_pool_options(&config.general.database_path, 1, 1)
        .await
        .expect("Failed to open store");

    let shared = Arc::new(SharedState::with_store(config, store).expect("Failed to build state"));
    let app = khaata::api::router(khaata::api::create_app_state(shared.clone()));
    (app, shared)
}

async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn profile_otp(shared: &SharedState, email: &str) -> (i32, Option<String>, bool) {
    let account = shared
        .store
        .accounts()
        .get_by_email(email)
        .await
        .unwrap()
        .expect("account missing");
    let profile = shared
        .store
        .accounts()
        .get_profile(account.id)
        .await
        .unwrap()
        .expect("profile missing");
    (account.id, profile.otp, profile.is_verified)
}

async fn signup(app: &Router, email: &str, password: &str) -> StatusCode {
    let (status, _) = post_json(
        app,
        "/api/signup/",
        serde_json::json!({
            "username": "asha",
            "email": email,
            "password": password,
            "phone_no": "9800000001",
            "business_name": "Asha Stores"
        }),
    )
    .await;
    status
}

async fn signup_and_verify(app: &Router, shared: &SharedState, email: &str, password: &str) {
    assert_eq!(signup(app, email, password).await, StatusCode::CREATED);

    let (_, otp, verified) = profile_otp(shared, email).await;
    assert!(!verified);
    let otp = otp.expect("signup OTP missing");

    let (status, _) = post_json(
        app,
        "/api/verify-signup-otp/",
        serde_json::json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn login_for_tokens(
    app: &Router,
    shared: &SharedState,
    email: &str,
    password: &str,
) -> (String, String) {
    let (status, _) = post_json(
        app,
        "/api/login/",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, otp, _) = profile_otp(shared, email).await;
    let otp = otp.expect("login OTP missing");

    let (status, body) = post_json(
        app,
        "/api/verify-login-otp/",
        serde_json::json!({ "email": email, "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        body["data"]["access"].as_str().unwrap().to_string(),
        body["data"]["refresh"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn signup_verify_login_issues_tokens() {
    let (app, shared) = spawn_app().await;

    signup_and_verify(&app, &shared, "asha@example.com", "correct-horse-9").await;

    // Verification cleared the OTP pair and flipped the flag.
    let (_, otp, verified) = profile_otp(&shared, "asha@example.com").await;
    assert!(verified);
    assert!(otp.is_none());

    let (access, _refresh) =
        login_for_tokens(&app, &shared, "asha@example.com", "correct-horse-9").await;

    // The access token opens protected routes.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products/")
                .header("Authorization", format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No token, no entry.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (app, _shared) = spawn_app().await;

    assert_eq!(
        signup(&app, "dup@example.com", "correct-horse-9").await,
        StatusCode::CREATED
    );
    assert_eq!(
        signup(&app, "dup@example.com", "correct-horse-9").await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn wrong_otp_is_rejected_and_correct_code_works_once() {
    let (app, shared) = spawn_app().await;

    assert_eq!(
        signup(&app, "once@example.com", "correct-horse-9").await,
        StatusCode::CREATED
    );
    let (_, otp, _) = profile_otp(&shared, "once@example.com").await;
    let otp = otp.unwrap();
    let wrong = if otp == "000000" { "000001" } else { "000000" };

    let (status, _) = post_json(
        &app,
        "/api/verify-signup-otp/",
        serde_json::json!({ "email": "once@example.com", "otp": wrong }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/verify-signup-otp/",
        serde_json::json!({ "email": "once@example.com", "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The code was consumed; replaying it finds no pending OTP.
    let (status, body) = post_json(
        &app,
        "/api/verify-signup-otp/",
        serde_json::json!({ "email": "once@example.com", "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("No OTP has been issued")
    );
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let mut config = Config::default();
    config.auth.otp_expiry_secs = 0;
    let (app, shared) = spawn_app_with(config).await;

    assert_eq!(
        signup(&app, "slow@example.com", "correct-horse-9").await,
        StatusCode::CREATED
    );
    let (_, otp, _) = profile_otp(&shared, "slow@example.com").await;
    let otp = otp.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let (status, body) = post_json(
        &app,
        "/api/verify-signup-otp/",
        serde_json::json!({ "email": "slow@example.com", "otp": otp }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn refresh_endpoint_rejects_access_tokens() {
    let (app, shared) = spawn_app().await;

    signup_and_verify(&app, &shared, "fresh@example.com", "correct-horse-9").await;
    let (access, refresh) =
        login_for_tokens(&app, &shared, "fresh@example.com", "correct-horse-9").await;

    let (status, _) = post_json(
        &app,
        "/api/token/refresh/",
        serde_json::json!({ "refresh": access }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_json(
        &app,
        "/api/token/refresh/",
        serde_json::json!({ "refresh": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["access"].as_str().is_some());
}

#[tokio::test]
async fn password_reset_flow_changes_the_password() {
    let (app, shared) = spawn_app().await;

    signup_and_verify(&app, &shared, "reset@example.com", "old-password-1").await;

    let (status, _) = post_json(
        &app,
        "/api/forget-password/",
        serde_json::json!({ "email": "reset@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (account_id, _, _) = profile_otp(&shared, "reset@example.com").await;
    let row = shared
        .store
        .accounts()
        .latest_reset_otp(account_id)
        .await
        .unwrap()
        .expect("reset OTP missing");

    // Resetting before verification is refused.
    let (status, _) = post_json(
        &app,
        "/api/reset-password/",
        serde_json::json!({ "email": "reset@example.com", "new_password": "new-password-2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/verify-forget-password-otp/",
        serde_json::json!({ "email": "reset@example.com", "otp": row.otp }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app,
        "/api/reset-password/",
        serde_json::json!({ "email": "reset@example.com", "new_password": "new-password-2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does.
    let (status, _) = post_json(
        &app,
        "/api/login/",
        serde_json::json!({ "email": "reset@example.com", "password": "old-password-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(
        &app,
        "/api/login/",
        serde_json::json!({ "email": "reset@example.com", "password": "new-password-2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unverified_account_cannot_log_in() {
    let (app, _shared) = spawn_app().await;

    assert_eq!(
        signup(&app, "limbo@example.com", "correct-horse-9").await,
        StatusCode::CREATED
    );

    let (status, body) = post_json(
        &app,
        "/api/login/",
        serde_json::json!({ "email": "limbo@example.com", "password": "correct-horse-9" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not been verified"));
}
