//! Registration and login.
//!
//! Registering creates a tenant together with its owner account and shop
//! profile. Both endpoints answer with a signed HS256 token.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::instrument;

use invoicefy_auth::{
    Account, JwtClaims, JwtError, PasswordError, hash_password, issue_token, normalize_email, validate_password,
    verify_password,
};
use invoicefy_core::error::require_text;
use invoicefy_core::{DomainError, TenantId};

use crate::config::AuthConfig;
use crate::store::{AccountStore, StoreError};

use super::{ServiceError, ShopService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already registered")]
    EmailTaken,

    /// Unknown email and wrong password are not told apart.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "account storage failure");
        AuthError::Store(e)
    }
}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Domain(e) => AuthError::Domain(e),
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(e: tokio::task::JoinError) -> Self {
        AuthError::Task(e.to_string())
    }
}

/// A signed-in account and its bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: Account,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    shop: ShopService,
    jwt_secret: Arc<[u8]>,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, shop: ShopService, auth: &AuthConfig) -> Self {
        Self {
            accounts,
            shop,
            jwt_secret: Arc::from(auth.jwt_secret.as_bytes()),
            token_ttl: Duration::minutes(auth.token_ttl_minutes),
            bcrypt_cost: auth.bcrypt_cost,
        }
    }

    #[instrument(skip(self, password), fields(email = %email.trim()))]
    pub async fn register(&self, email: &str, password: &str, shop_name: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email)?;
        validate_password(password)?;
        let shop_name = require_text("shop_name", shop_name)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

        let tenant_id = TenantId::new();
        self.shop.create(tenant_id, &shop_name).await?;

        let account = Account::register_owner(&email, password_hash, tenant_id, Utc::now())?;
        if let Err(e) = self.accounts.insert(&account).await {
            // Lost a race for the same email: undo the profile.
            if let Err(cleanup) = self.shop.remove(tenant_id).await {
                tracing::warn!(error = %cleanup, tenant_id = %tenant_id, "orphaned shop profile left behind");
            }
            return Err(match e {
                StoreError::Duplicate(_) => AuthError::EmailTaken,
                other => other.into(),
            });
        }

        tracing::info!(tenant_id = %tenant_id, account_id = %account.id, "tenant registered");
        self.session(account)
    }

    #[instrument(skip(self, password), fields(email = %email.trim()))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            tracing::debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = account.password_hash.clone();
        if !tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await? {
            tracing::debug!(account_id = %account.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, "login succeeded");
        self.session(account)
    }

    fn session(&self, account: Account) -> Result<Session, AuthError> {
        let claims = JwtClaims::new(
            account.id,
            account.tenant_id,
            account.roles.clone(),
            Utc::now(),
            self.token_ttl,
        );
        let token = issue_token(&self.jwt_secret, &claims)?;
        Ok(Session { token, account })
    }
}
