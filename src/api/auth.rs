use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::db::NewAccount;
use crate::services::token;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_no: Option<String>,
    pub business_name: Option<String>,
}

#[derive(Deserialize)]
pub struct OtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Account id of the caller, injected by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AccountId(pub i32);

/// Validates the `Authorization: Bearer` access token and injects the
/// caller's [`AccountId`] into request extensions. Stateless: the JWT
/// signature is the whole session.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = token::validate_access_token(token, &state.config().auth)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let account_id = claims
        .account_id()
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AccountId(account_id));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get("Authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validation::validate_email(&req.email)?.to_string();

    let account = state
        .auth()
        .signup(NewAccount {
            username: req.username,
            email,
            password: req.password,
            phone_no: req.phone_no,
            business_name: req.business_name,
        })
        .await?;

    let body = ApiResponse::success(serde_json::json!({
        "message": "OTP sent to your email",
        "account": account,
    }));
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn verify_signup_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;
    let otp = validation::validate_otp(&req.otp)?;

    state.auth().verify_signup_otp(email, otp).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account verified successfully",
    ))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;

    state.auth().login(email, &req.password).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "OTP sent to your email",
    ))))
}

pub async fn verify_login_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<ApiResponse<TokenPairResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;
    let otp = validation::validate_otp(&req.otp)?;

    let pair = state.auth().verify_login_otp(email, otp).await?;

    Ok(Json(ApiResponse::success(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    })))
}

pub async fn forget_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;

    state.auth().forgot_password(email).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "OTP sent to your email",
    ))))
}

pub async fn verify_forget_password_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;
    let otp = validation::validate_otp(&req.otp)?;

    state.auth().verify_reset_otp(email, otp).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "OTP verified. You may now reset your password",
    ))))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = validation::validate_email(&req.email)?;

    state.auth().reset_password(email, &req.new_password).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset successfully",
    ))))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, ApiError> {
    let access = state.auth().refresh_token(&req.refresh).await?;

    Ok(Json(ApiResponse::success(AccessTokenResponse { access })))
}
