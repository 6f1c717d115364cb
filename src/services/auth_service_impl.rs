//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::info;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{NewAccount, Store};
use crate::services::auth_service::{AccountInfo, AuthError, AuthService};
use crate::services::email::Mailer;
use crate::services::token::{self, TokenPair};

pub struct SeaOrmAuthService {
    store: Store,
    mailer: Mailer,
    auth: AuthConfig,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, mailer: Mailer, auth: AuthConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            mailer,
            auth,
            security,
        }
    }

    fn otp_window(&self) -> Duration {
        Duration::seconds(i64::try_from(self.auth.otp_expiry_secs).unwrap_or(300))
    }
}

/// Six-digit zero-padded code. "000042" is as valid as "999999".
fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Check a submitted code against a stored one.
///
/// Order matters and is observable through the error: a missing code
/// wins over expiry, expiry wins over mismatch. An expired code is
/// rejected even when the digits match.
fn check_otp(
    stored: Option<&str>,
    issued_at: Option<DateTime<Utc>>,
    submitted: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<(), AuthError> {
    let (Some(stored), Some(issued_at)) = (stored, issued_at) else {
        return Err(AuthError::NoPendingOtp);
    };

    if now - issued_at > window {
        return Err(AuthError::OtpExpired);
    }

    if stored != submitted {
        return Err(AuthError::OtpMismatch);
    }

    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn signup(&self, new: NewAccount) -> Result<AccountInfo, AuthError> {
        if new.username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if new.password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.store.accounts().get_by_email(&new.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let otp = generate_otp();
        let email = new.email.clone();
        let account = self
            .store
            .accounts()
            .create_with_profile(new, &otp, Utc::now(), &self.security)
            .await?;

        self.mailer.send_otp(&email, &otp);

        info!("Registered account {} ({})", account.id, account.email);
        Ok(AccountInfo {
            id: account.id,
            username: account.username,
            email: account.email,
        })
    }

    async fn verify_signup_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let profile = self
            .store
            .accounts()
            .get_profile(account.id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("No profile for account {}", account.id)))?;

        check_otp(
            profile.otp.as_deref(),
            profile.otp_created_at,
            otp,
            Utc::now(),
            self.otp_window(),
        )?;

        self.store.accounts().clear_profile_otp(account.id, true).await?;

        info!("Account {} completed signup verification", account.id);
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid = self.store.accounts().verify_password(email, password).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self
            .store
            .accounts()
            .get_profile(account.id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("No profile for account {}", account.id)))?;

        if !profile.is_verified {
            return Err(AuthError::OtpNotVerified);
        }

        let otp = generate_otp();
        self.store
            .accounts()
            .set_profile_otp(account.id, &otp, Utc::now())
            .await?;
        self.mailer.send_otp(&account.email, &otp);

        Ok(())
    }

    async fn verify_login_otp(&self, email: &str, otp: &str) -> Result<TokenPair, AuthError> {
        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let profile = self
            .store
            .accounts()
            .get_profile(account.id)
            .await?
            .ok_or_else(|| AuthError::Internal(format!("No profile for account {}", account.id)))?;

        check_otp(
            profile.otp.as_deref(),
            profile.otp_created_at,
            otp,
            Utc::now(),
            self.otp_window(),
        )?;

        self.store.accounts().clear_profile_otp(account.id, false).await?;

        let pair = token::issue_pair(account.id, &self.auth)?;

        info!("Account {} logged in", account.id);
        Ok(pair)
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let otp = generate_otp();
        self.store
            .accounts()
            .create_reset_otp(account.id, &otp, Utc::now())
            .await?;
        self.mailer.send_otp(&account.email, &otp);

        Ok(())
    }

    async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        // Only the newest reset row counts; stale rows are dead weight.
        let row = self
            .store
            .accounts()
            .latest_reset_otp(account.id)
            .await?
            .ok_or(AuthError::NoPendingOtp)?;

        check_otp(
            Some(&row.otp),
            Some(row.otp_created_at),
            otp,
            Utc::now(),
            self.otp_window(),
        )?;

        self.store.accounts().mark_reset_verified(row).await?;

        Ok(())
    }

    async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let account = self
            .store
            .accounts()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let row = self
            .store
            .accounts()
            .latest_reset_otp(account.id)
            .await?
            .ok_or(AuthError::NoPendingOtp)?;

        if !row.is_verified {
            return Err(AuthError::OtpNotVerified);
        }

        self.store
            .accounts()
            .update_password(account.id, new_password, &self.security)
            .await?;
        self.store.accounts().delete_reset_otp(row.id).await?;

        info!("Account {} reset its password", account.id);
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = token::validate_refresh_token(refresh_token, &self.auth)?;
        let account_id = claims.account_id()?;

        self.store
            .accounts()
            .get_by_id(account_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access = token::issue_access_token(account_id, &self.auth)?;
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn missing_code_beats_expiry_and_mismatch() {
        let now = Utc::now();
        let err = check_otp(None, None, "123456", now, Duration::seconds(300)).unwrap_err();
        assert!(matches!(err, AuthError::NoPendingOtp));
    }

    #[test]
    fn expired_code_is_rejected_even_when_digits_match() {
        let now = Utc::now();
        let issued = now - Duration::seconds(301);
        let err = check_otp(
            Some("123456"),
            Some(issued),
            "123456",
            now,
            Duration::seconds(300),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));
    }

    #[test]
    fn fresh_mismatch_is_a_mismatch() {
        let now = Utc::now();
        let issued = now - Duration::seconds(10);
        let err = check_otp(
            Some("123456"),
            Some(issued),
            "654321",
            now,
            Duration::seconds(300),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::OtpMismatch));
    }

    #[test]
    fn fresh_match_passes() {
        let now = Utc::now();
        let issued = now - Duration::seconds(299);
        check_otp(
            Some("000042"),
            Some(issued),
            "000042",
            now,
            Duration::seconds(300),
        )
        .unwrap();
    }
}
