use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, BillingError, PartyError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    /// A unique field collided. For parties the colliding row rides
    /// along and is echoed in the response body.
    Conflict {
        message: String,
        existing: Option<serde_json::Value>,
    },

    Unauthorized(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => {
                let body = ApiResponse::<()>::error(msg);
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            ApiError::ValidationError(msg) => {
                let body = ApiResponse::<()>::error(msg);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Conflict { message, existing } => {
                let body = serde_json::json!({
                    "success": false,
                    "error": message,
                    "existing": existing,
                });
                (StatusCode::CONFLICT, Json(body)).into_response()
            }
            ApiError::Unauthorized(msg) => {
                let body = ApiResponse::<()>::error(msg);
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                let body = ApiResponse::<()>::error("A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                let body = ApiResponse::<()>::error("An internal error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: msg.into(),
            existing: None,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::UserNotFound => ApiError::NotFound(message),
            AuthError::EmailTaken => ApiError::conflict(message),
            AuthError::InvalidCredentials | AuthError::Token(_) => ApiError::Unauthorized(message),
            AuthError::NoPendingOtp
            | AuthError::OtpExpired
            | AuthError::OtpMismatch
            | AuthError::OtpNotVerified
            | AuthError::Validation(_) => ApiError::ValidationError(message),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PartyError> for ApiError {
    fn from(err: PartyError) -> Self {
        let message = err.to_string();
        match err {
            PartyError::InvalidCategory
            | PartyError::NoSpecialization
            | PartyError::Validation(_) => ApiError::ValidationError(message),
            PartyError::DuplicateCustomer { existing, .. } => ApiError::Conflict {
                message,
                existing: serde_json::to_value(&*existing).ok(),
            },
            PartyError::DuplicateSupplier { existing, .. } => ApiError::Conflict {
                message,
                existing: serde_json::to_value(&*existing).ok(),
            },
            PartyError::NotFound => ApiError::NotFound(message),
            PartyError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        match err {
            BillingError::NoLines | BillingError::Validation(_) => {
                ApiError::ValidationError(message)
            }
            BillingError::DuplicateInvoiceNumber => ApiError::conflict(message),
            BillingError::NotFound => ApiError::NotFound(message),
            BillingError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}
