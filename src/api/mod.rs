use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod billing;
mod error;
mod expenses;
mod parties;
mod products;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn parties(&self) -> &Arc<dyn crate::services::PartyService> {
        &self.shared.party_service
    }

    #[must_use]
    pub fn billing(&self) -> &Arc<dyn crate::services::BillingService> {
        &self.shared.billing_service
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/signup/", post(auth::signup))
        .route("/verify-signup-otp/", post(auth::verify_signup_otp))
        .route("/login/", post(auth::login))
        .route("/verify-login-otp/", post(auth::verify_login_otp))
        .route("/forget-password/", post(auth::forget_password))
        .route(
            "/verify-forget-password-otp/",
            post(auth::verify_forget_password_otp),
        )
        .route("/reset-password/", post(auth::reset_password))
        .route("/token/refresh/", post(auth::refresh_token))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/products/", get(products::list_products))
        .route("/products/", post(products::create_product))
        .route("/products/{id}", get(products::get_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route("/parties/", get(parties::list_parties))
        .route("/parties/", post(parties::create_party))
        .route("/parties/{id}", get(parties::get_party))
        .route("/parties/{id}", put(parties::update_party))
        .route("/parties/{id}", delete(parties::delete_party))
        .route("/expenses/", get(expenses::list_expenses))
        .route("/expenses/", post(expenses::create_expense))
        .route("/expenses/{id}", get(expenses::get_expense))
        .route("/expenses/{id}", put(expenses::update_expense))
        .route("/expenses/{id}", delete(expenses::delete_expense))
        .route("/billing/", get(billing::list_invoices))
        .route("/billing/", post(billing::create_invoice))
        .route("/billing/{id}", get(billing::get_invoice))
        .route("/billing/{id}", put(billing::update_invoice))
        .route("/billing/{id}", delete(billing::delete_invoice))
        .route("/billing/{id}/items", post(billing::add_invoice_item))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
