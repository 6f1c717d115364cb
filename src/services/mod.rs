pub mod auth_service;
pub use auth_service::{AccountInfo, AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod billing_service;
pub use billing_service::{BillingError, BillingService, InvoiceDetail};

pub mod billing_service_impl;
pub use billing_service_impl::SeaOrmBillingService;

pub mod party_service;
pub use party_service::{PartyDraft, PartyError, PartyService};

pub mod party_service_impl;
pub use party_service_impl::SeaOrmPartyService;

pub mod email;
pub use email::Mailer;

pub mod token;
pub use token::{Claims, TokenError, TokenPair};
