//! JWT access/refresh token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — account ID.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
    /// "access" or "refresh"
    pub token_type: String,
}

impl Claims {
    pub fn account_id(&self) -> Result<i32, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid(format!("non-numeric subject: {}", self.sub)))
    }
}

/// Access + refresh pair minted on a verified login OTP.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn issue(
    account_id: i32,
    token_type: &str,
    lifetime_secs: u64,
    config: &AuthConfig,
) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + i64::try_from(lifetime_secs).unwrap_or(i64::MAX),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| TokenError::Invalid(format!("JWT encode: {e}")))
}

pub fn issue_access_token(account_id: i32, config: &AuthConfig) -> Result<String, TokenError> {
    issue(
        account_id,
        TOKEN_TYPE_ACCESS,
        config.access_token_lifetime_secs,
        config,
    )
}

pub fn issue_pair(account_id: i32, config: &AuthConfig) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access: issue_access_token(account_id, config)?,
        refresh: issue(
            account_id,
            TOKEN_TYPE_REFRESH,
            config.refresh_token_lifetime_secs,
            config,
        )?,
    })
}

fn decode(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

/// Validate an access token (signature, expiry, issuer, type) and
/// return the verified claims. Purely stateless — no database lookup.
/// This is the entry point for the request-auth middleware.
pub fn validate_access_token(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    let claims = decode(token, config)?;
    if claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(TokenError::Invalid(format!(
            "expected access token, got {}",
            claims.token_type
        )));
    }
    Ok(claims)
}

/// Validate a refresh token. Used only by the refresh endpoint.
pub fn validate_refresh_token(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    let claims = decode(token, config)?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(TokenError::Invalid(format!(
            "expected refresh token, got {}",
            claims.token_type
        )));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "khaata-test".to_string(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 2_592_000,
            otp_expiry_secs: 300,
        }
    }

    #[test]
    fn pair_roundtrip() {
        let config = test_config();
        let pair = issue_pair(42, &config).unwrap();

        let access = validate_access_token(&pair.access, &config).unwrap();
        assert_eq!(access.account_id().unwrap(), 42);
        assert_eq!(access.iss, "khaata-test");

        let refresh = validate_refresh_token(&pair.refresh, &config).unwrap();
        assert_eq!(refresh.account_id().unwrap(), 42);
    }

    #[test]
    fn token_types_do_not_cross() {
        let config = test_config();
        let pair = issue_pair(7, &config).unwrap();

        assert!(validate_access_token(&pair.refresh, &config).is_err());
        assert!(validate_refresh_token(&pair.access, &config).is_err());
    }

    #[test]
    fn jti_is_unique() {
        let config = test_config();
        let t1 = issue_access_token(1, &config).unwrap();
        let t2 = issue_access_token(1, &config).unwrap();

        let c1 = validate_access_token(&t1, &config).unwrap();
        let c2 = validate_access_token(&t2, &config).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_access_token(1, &config).unwrap();

        let mut other = test_config();
        other.jwt_secret = "other-secret".to_string();
        assert!(validate_access_token(&token, &other).is_err());
    }
}
