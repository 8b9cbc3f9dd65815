//! Application services.
//!
//! Each service owns one slice of the domain and sits between the API layer
//! and the stores: it loads records, runs the domain rules and writes the
//! result back in a single document write. No HTTP concerns live here.

use std::sync::Arc;

use thiserror::Error;

use invoicefy_core::DomainError;

use crate::config::{AppConfig, AuthConfig, StoreBackend};
use crate::store::{
    AccountStore, DocumentStore, InMemoryAccountStore, InMemoryDocumentStore, PostgresAccountStore,
    PostgresDocumentStore, StoreError, connect_postgres,
};

pub mod accounts;
pub mod catalog;
pub mod invoices;
pub mod shop;

pub use accounts::{AccountService, AuthError, Session};
pub use catalog::{CustomerService, ProductService};
pub use invoices::InvoiceService;
pub use shop::ShopService;

/// Failure of a customer, product or shop profile operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Serialization or backend failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServiceError::Domain(DomainError::NotFound),
            StoreError::Duplicate(msg) => ServiceError::Domain(DomainError::Duplicate(msg)),
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::Conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every service, wired to one pair of stores.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub customers: CustomerService,
    pub products: ProductService,
    pub invoices: InvoiceService,
    pub shop: ShopService,
}

impl Services {
    pub fn new(documents: Arc<dyn DocumentStore>, accounts: Arc<dyn AccountStore>, auth: &AuthConfig) -> Self {
        let shop = ShopService::new(documents.clone());
        Self {
            accounts: AccountService::new(accounts, shop.clone(), auth),
            customers: CustomerService::new(documents.clone()),
            products: ProductService::new(documents.clone()),
            invoices: InvoiceService::new(documents),
            shop,
        }
    }

    /// Fresh in-memory stores (tests and local development).
    pub fn in_memory(auth: &AuthConfig) -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryAccountStore::new()),
            auth,
        )
    }

    /// Stores selected by `store.backend`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        match config.store.backend {
            StoreBackend::Memory => {
                tracing::info!("using in-memory store");
                Ok(Self::in_memory(&config.auth))
            }
            StoreBackend::Postgres => {
                let url = config.store.database_url.as_deref().ok_or_else(|| {
                    StoreError::Backend("store.database_url is not configured".to_string())
                })?;
                let pool = connect_postgres(url, config.store.max_connections).await?;
                tracing::info!("using postgres store");
                Ok(Self::new(
                    Arc::new(PostgresDocumentStore::new(pool.clone())),
                    Arc::new(PostgresAccountStore::new(pool)),
                    &config.auth,
                ))
            }
        }
    }
}
