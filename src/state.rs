use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BillingService, Mailer, PartyService, SeaOrmAuthService, SeaOrmBillingService,
    SeaOrmPartyService,
};

/// Everything the request handlers share: config, the store, and the
/// domain services wired over it.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub mailer: Mailer,

    pub auth_service: Arc<dyn AuthService>,

    pub party_service: Arc<dyn PartyService>,

    pub billing_service: Arc<dyn BillingService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Build state over an already-open store. Integration tests use
    /// this with an in-memory database.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let mailer = Mailer::start(&config.email)?;

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            mailer.clone(),
            config.auth.clone(),
            config.security.clone(),
        ));

        let party_service: Arc<dyn PartyService> = Arc::new(SeaOrmPartyService::new(
            store.clone(),
            config.general.party_inactivity_days,
        ));

        let billing_service: Arc<dyn BillingService> =
            Arc::new(SeaOrmBillingService::new(store.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            mailer,
            auth_service,
            party_service,
            billing_service,
        })
    }
}
