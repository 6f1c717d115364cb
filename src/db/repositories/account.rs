use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{accounts, password_reset_otps, profiles};

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Everything a new signup needs persisted in one shot.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_no: Option<String>,
    pub business_name: Option<String>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Create the account and its profile (with the initial signup OTP)
    /// as a single unit.
    pub async fn create_with_profile(
        &self,
        new: NewAccount,
        otp: &str,
        issued_at: DateTime<Utc>,
        security: &SecurityConfig,
    ) -> Result<Account> {
        let password = new.password;
        let config = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now();
        let txn = self.conn.begin().await?;

        let account = accounts::ActiveModel {
            username: Set(new.username),
            email: Set(new.email.to_lowercase()),
            password_hash: Set(password_hash),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        profiles::ActiveModel {
            account_id: Set(account.id),
            phone_no: Set(new.phone_no),
            business_name: Set(new.business_name),
            otp: Set(Some(otp.to_string())),
            otp_created_at: Set(Some(issued_at)),
            is_verified: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(Account::from(account))
    }

    /// Verify a password against the stored hash.
    /// Argon2 runs on `spawn_blocking` because it is CPU-intensive and
    /// would stall the async runtime if run inline.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<bool> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        let password_hash = account.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_password(
        &self,
        account_id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.conn)
            .await
            .context("Failed to query account for password update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {account_id}"))?;

        let password = new_password.to_string();
        let config = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn get_profile(&self, account_id: i32) -> Result<Option<profiles::Model>> {
        let profile = profiles::Entity::find()
            .filter(profiles::Column::AccountId.eq(account_id))
            .one(&self.conn)
            .await
            .context("Failed to query profile")?;

        Ok(profile)
    }

    /// Store a fresh OTP pair on the profile. Both fields move together.
    pub async fn set_profile_otp(
        &self,
        account_id: i32,
        otp: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<()> {
        let profile = self
            .get_profile(account_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found for account {account_id}"))?;

        let mut active: profiles::ActiveModel = profile.into();
        active.otp = Set(Some(otp.to_string()));
        active.otp_created_at = Set(Some(issued_at));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Null out the OTP pair, optionally flipping the verified flag
    /// (signup path).
    pub async fn clear_profile_otp(&self, account_id: i32, mark_verified: bool) -> Result<()> {
        let profile = self
            .get_profile(account_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found for account {account_id}"))?;

        let mut active: profiles::ActiveModel = profile.into();
        active.otp = Set(None);
        active.otp_created_at = Set(None);
        if mark_verified {
            active.is_verified = Set(true);
        }
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Issue a new password-reset row. Earlier rows stay behind but are
    /// never selected again.
    pub async fn create_reset_otp(
        &self,
        account_id: i32,
        otp: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<password_reset_otps::Model> {
        let row = password_reset_otps::ActiveModel {
            account_id: Set(account_id),
            otp: Set(otp.to_string()),
            otp_created_at: Set(issued_at),
            is_verified: Set(false),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row)
    }

    pub async fn latest_reset_otp(
        &self,
        account_id: i32,
    ) -> Result<Option<password_reset_otps::Model>> {
        let row = password_reset_otps::Entity::find()
            .filter(password_reset_otps::Column::AccountId.eq(account_id))
            .order_by_desc(password_reset_otps::Column::OtpCreatedAt)
            .one(&self.conn)
            .await
            .context("Failed to query password reset OTP")?;

        Ok(row)
    }

    pub async fn mark_reset_verified(&self, row: password_reset_otps::Model) -> Result<()> {
        let mut active: password_reset_otps::ActiveModel = row.into();
        active.is_verified = Set(true);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn delete_reset_otp(&self, id: i32) -> Result<()> {
        password_reset_otps::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
