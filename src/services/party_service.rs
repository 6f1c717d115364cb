//! Domain service for customer and supplier management.
//!
//! A party is a thin header row; exactly one specialization (customer
//! or supplier) hangs off it. The service owns category validation and
//! the duplicate checks, the repository owns the two-row writes.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::PartyRecord;
use crate::entities::{customers, suppliers};

/// Errors specific to party operations.
#[derive(Debug, Error)]
pub enum PartyError {
    #[error("Invalid category. Must be 'Customer' or 'Supplier'")]
    InvalidCategory,

    #[error("A customer with this {field} already exists")]
    DuplicateCustomer {
        field: &'static str,
        existing: Box<customers::Model>,
    },

    #[error("A supplier with this {field} already exists")]
    DuplicateSupplier {
        field: &'static str,
        existing: Box<suppliers::Model>,
    },

    #[error("Party not found")]
    NotFound,

    #[error("No customer or supplier is attached to this party")]
    NoSpecialization,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for PartyError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PartyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Caller-supplied party fields. Which ones are required depends on
/// the category: customers need `name`, suppliers need `name` and
/// `code`. On update, absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct PartyDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub customer_code: Option<String>,
    pub address: Option<String>,
    pub open_balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
    pub preferred_payment_method: Option<String>,
    pub loyalty_points: Option<i32>,
    pub referred_by: Option<String>,
    pub notes: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

/// Domain service trait for party management.
#[async_trait::async_trait]
pub trait PartyService: Send + Sync {
    /// Creates a party with its specialization.
    ///
    /// # Errors
    ///
    /// Returns [`PartyError::InvalidCategory`] for an unknown category
    /// and the duplicate variants when a unique field collides; the
    /// colliding row rides along in the error.
    async fn create(&self, category: &str, draft: PartyDraft) -> Result<PartyRecord, PartyError>;

    async fn get(&self, id: i32) -> Result<PartyRecord, PartyError>;

    async fn list(
        &self,
        category: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PartyRecord>, u64), PartyError>;

    /// Partial update of whichever specialization the party carries.
    async fn update(&self, id: i32, draft: PartyDraft) -> Result<PartyRecord, PartyError>;

    /// Deletes the party, its specialization, and any supplier infos.
    async fn delete(&self, id: i32) -> Result<(), PartyError>;
}
