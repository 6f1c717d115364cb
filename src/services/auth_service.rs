//! Domain service for account signup, login, and password recovery.
//!
//! Every flow here is OTP-gated: signup and login both hand out a
//! six-digit code by email and nothing proceeds until the caller echoes
//! it back. Password recovery runs on its own OTP table so an in-flight
//! reset never disturbs the profile's signup/login code.

use serde::Serialize;
use thiserror::Error;

use crate::db::NewAccount;
use crate::services::token::{TokenError, TokenPair};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No OTP has been issued for this account")]
    NoPendingOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpMismatch,

    #[error("OTP has not been verified")]
    OtpNotVerified,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Registers an account and emails the signup OTP.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] if the email is already registered.
    async fn signup(&self, new: NewAccount) -> Result<AccountInfo, AuthError>;

    /// Confirms the signup OTP and marks the profile verified.
    async fn verify_signup_otp(&self, email: &str, otp: &str) -> Result<(), AuthError>;

    /// Checks credentials and emails a login OTP. No tokens yet.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the password is wrong,
    /// [`AuthError::OtpNotVerified`] if signup was never completed.
    async fn login(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Confirms the login OTP and mints the access/refresh pair.
    async fn verify_login_otp(&self, email: &str, otp: &str) -> Result<TokenPair, AuthError>;

    /// Starts password recovery by emailing a reset OTP.
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    /// Confirms the reset OTP, unlocking `reset_password`.
    async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<(), AuthError>;

    /// Replaces the password after a verified reset OTP, consuming it.
    async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AuthError>;

    /// Exchanges a valid refresh token for a fresh access token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<String, AuthError>;
}
