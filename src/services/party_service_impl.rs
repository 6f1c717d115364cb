//! `SeaORM` implementation of the `PartyService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::db::{CustomerPatch, PartyRecord, Store, SupplierPatch};
use crate::models::{CustomerFields, PartyCategory, PartySpec, SupplierFields};
use crate::services::party_service::{PartyDraft, PartyError, PartyService};

pub struct SeaOrmPartyService {
    store: Store,
    inactivity_days: i64,
}

impl SeaOrmPartyService {
    #[must_use]
    pub const fn new(store: Store, inactivity_days: i64) -> Self {
        Self {
            store,
            inactivity_days,
        }
    }

    /// Duplicate scan for a customer, in fixed order: email, then
    /// phone, then customer code. `exclude` skips the row being
    /// updated so it cannot collide with itself.
    async fn check_customer_duplicates(
        &self,
        email: Option<&str>,
        phone_no: Option<&str>,
        customer_code: Option<&str>,
        exclude: Option<i32>,
    ) -> Result<(), PartyError> {
        if let Some(email) = email
            && let Some(existing) = self.store.parties().find_customer_by_email(email).await?
            && Some(existing.id) != exclude
        {
            return Err(PartyError::DuplicateCustomer {
                field: "email",
                existing: Box::new(existing),
            });
        }

        if let Some(phone_no) = phone_no
            && let Some(existing) = self.store.parties().find_customer_by_phone(phone_no).await?
            && Some(existing.id) != exclude
        {
            return Err(PartyError::DuplicateCustomer {
                field: "phone number",
                existing: Box::new(existing),
            });
        }

        if let Some(code) = customer_code
            && let Some(existing) = self.store.parties().find_customer_by_code(code).await?
            && Some(existing.id) != exclude
        {
            return Err(PartyError::DuplicateCustomer {
                field: "customer code",
                existing: Box::new(existing),
            });
        }

        Ok(())
    }

    /// Duplicate scan for a supplier: code first, then name.
    async fn check_supplier_duplicates(
        &self,
        code: Option<&str>,
        name: Option<&str>,
        exclude: Option<i32>,
    ) -> Result<(), PartyError> {
        if let Some(code) = code
            && let Some(existing) = self.store.parties().find_supplier_by_code(code).await?
            && Some(existing.id) != exclude
        {
            return Err(PartyError::DuplicateSupplier {
                field: "code",
                existing: Box::new(existing),
            });
        }

        if let Some(name) = name
            && let Some(existing) = self.store.parties().find_supplier_by_name(name).await?
            && Some(existing.id) != exclude
        {
            return Err(PartyError::DuplicateSupplier {
                field: "name",
                existing: Box::new(existing),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl PartyService for SeaOrmPartyService {
    async fn create(&self, category: &str, draft: PartyDraft) -> Result<PartyRecord, PartyError> {
        let category = PartyCategory::parse(category).ok_or(PartyError::InvalidCategory)?;

        let spec = match category {
            PartyCategory::Customer => {
                let name = draft
                    .name
                    .clone()
                    .ok_or_else(|| PartyError::Validation("Customer name is required".to_string()))?;

                self.check_customer_duplicates(
                    draft.email.as_deref(),
                    draft.phone_no.as_deref(),
                    draft.customer_code.as_deref(),
                    None,
                )
                .await?;

                PartySpec::Customer(CustomerFields {
                    name,
                    email: draft.email,
                    phone_no: draft.phone_no,
                    customer_code: draft.customer_code,
                    address: draft.address,
                    open_balance: draft.open_balance.unwrap_or_default(),
                    credit_limit: draft.credit_limit.unwrap_or_default(),
                    preferred_payment_method: draft.preferred_payment_method,
                    loyalty_points: draft.loyalty_points.unwrap_or(0),
                    referred_by: draft.referred_by,
                    notes: draft.notes,
                })
            }
            PartyCategory::Supplier => {
                let name = draft
                    .name
                    .clone()
                    .ok_or_else(|| PartyError::Validation("Supplier name is required".to_string()))?;
                let code = draft
                    .code
                    .clone()
                    .ok_or_else(|| PartyError::Validation("Supplier code is required".to_string()))?;

                self.check_supplier_duplicates(Some(&code), Some(&name), None)
                    .await?;

                PartySpec::Supplier(SupplierFields { name, code })
            }
        };

        let record = self
            .store
            .parties()
            .create(&spec, draft.is_active.unwrap_or(true))
            .await?;

        Ok(record)
    }

    async fn get(&self, id: i32) -> Result<PartyRecord, PartyError> {
        self.store
            .parties()
            .get(id)
            .await?
            .ok_or(PartyError::NotFound)
    }

    async fn list(
        &self,
        category: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<PartyRecord>, u64), PartyError> {
        let result = self.store.parties().list(category, page, page_size).await?;
        Ok(result)
    }

    async fn update(&self, id: i32, draft: PartyDraft) -> Result<PartyRecord, PartyError> {
        let record = self
            .store
            .parties()
            .get(id)
            .await?
            .ok_or(PartyError::NotFound)?;

        if let Some(customer) = record.customer {
            self.check_customer_duplicates(
                draft.email.as_deref(),
                draft.phone_no.as_deref(),
                draft.customer_code.as_deref(),
                Some(customer.id),
            )
            .await?;

            let patch = CustomerPatch {
                name: draft.name,
                email: draft.email,
                phone_no: draft.phone_no,
                customer_code: draft.customer_code,
                address: draft.address,
                open_balance: draft.open_balance,
                credit_limit: draft.credit_limit,
                preferred_payment_method: draft.preferred_payment_method,
                loyalty_points: draft.loyalty_points,
                referred_by: draft.referred_by,
                notes: draft.notes,
            };

            let merged = crate::db::repositories::party::merge_customer(customer, &patch);
            self.store.parties().update_customer(merged).await?;
        } else if let Some(supplier) = record.supplier {
            self.check_supplier_duplicates(
                draft.code.as_deref(),
                draft.name.as_deref(),
                Some(supplier.id),
            )
            .await?;

            let patch = SupplierPatch {
                name: draft.name,
                code: draft.code,
            };

            let merged = crate::db::repositories::party::merge_supplier(supplier, &patch);
            self.store.parties().update_supplier(merged).await?;
        } else {
            // Orphaned party header. If it has also gone stale, demote
            // it to inactive before reporting the real problem.
            let idle = Utc::now() - record.party.updated_at;
            if record.party.is_active && idle > Duration::days(self.inactivity_days) {
                warn!(
                    "Party {} idle for {} days; marking inactive",
                    id,
                    idle.num_days()
                );
                self.store.parties().set_inactive(id).await?;
            }
            return Err(PartyError::NoSpecialization);
        }

        self.store
            .parties()
            .get(id)
            .await?
            .ok_or(PartyError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), PartyError> {
        let removed = self.store.parties().remove(id).await?;
        if !removed {
            return Err(PartyError::NotFound);
        }
        info!("Deleted party {}", id);
        Ok(())
    }
}
