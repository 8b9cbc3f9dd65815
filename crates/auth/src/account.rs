//! Login accounts.
//!
//! An account belongs to exactly one tenant. Emails are unique across all
//! tenants (they are the login name), compared case-insensitively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicefy_core::{DomainError, DomainResult, TenantId, UserId};

use crate::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The owner account created together with a new tenant.
    pub fn register_owner(
        email: &str,
        password_hash: String,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: UserId::new(),
            tenant_id,
            email: normalize_email(email)?,
            password_hash,
            roles: vec![Role::admin()],
            created_at: now,
        })
    }
}

/// Trim + lowercase, with a basic shape check.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("invalid email format")),
    }
}
