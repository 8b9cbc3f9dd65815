//! Login account storage.
//!
//! Accounts are not tenant-scoped documents: the email is a global login name,
//! so they get their own store keyed by normalized email.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::{PgPool, Row};
use tracing::instrument;

use invoicefy_auth::Account;

use super::StoreError;
use super::postgres::map_sqlx_error;

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Duplicate` when the email is already registered.
    async fn insert(&self, account: &Account) -> Result<(), StoreError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    by_email: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("account store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let mut by_email = self.by_email.write().map_err(|_| poisoned())?;
        if by_email.contains_key(&account.email) {
            return Err(StoreError::Duplicate(format!("account {}", account.email)));
        }
        by_email.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let by_email = self.by_email.read().map_err(|_| poisoned())?;
        Ok(by_email.get(email).cloned())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let body = serde_json::to_value(account)?;
        sqlx::query(
            "INSERT INTO accounts (id, tenant_id, email, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id.as_uuid())
        .bind(account.tenant_id.as_uuid())
        .bind(&account.email)
        .bind(&body)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT body FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body: serde_json::Value = row
            .try_get("body")
            .map_err(|e| StoreError::Backend(format!("failed to read account body: {e}")))?;
        Ok(Some(serde_json::from_value(body)?))
    }
}
