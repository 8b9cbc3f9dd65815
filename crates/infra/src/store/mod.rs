//! Tenant-scoped document store.
//!
//! Records are stored as JSON documents keyed by `(tenant, collection, id)`.
//! The store owns versioning: a document is at version 1 after insert and
//! every replace/patch increments it. An optional per-tenant `unique_key`
//! (e.g. an invoice number) is enforced by the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use invoicefy_core::{AggregateId, ExpectedVersion, TenantId};

pub mod accounts;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use accounts::{AccountStore, InMemoryAccountStore, PostgresAccountStore};
pub use in_memory::InMemoryDocumentStore;
pub use postgres::{PostgresDocumentStore, connect_postgres};
pub use repository::{Document, Repository, collections};

/// Address of one document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub tenant_id: TenantId,
    pub collection: &'static str,
    pub id: AggregateId,
}

impl DocumentKey {
    pub fn new(tenant_id: TenantId, collection: &'static str, id: AggregateId) -> Self {
        Self {
            tenant_id,
            collection,
            id,
        }
    }
}

impl core::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.collection, self.id)
    }
}

/// A document as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: DocumentKey,
    pub unique_key: Option<String>,
    pub version: u64,
    pub body: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    /// The id or the unique key is already taken.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Optimistic concurrency check failed.
    #[error("version conflict: {0}")]
    Conflict(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub(crate) fn version_conflict(expected: ExpectedVersion, actual: u64) -> StoreError {
    StoreError::Conflict(format!("expected {expected:?}, found version {actual}"))
}

/// Document store boundary.
///
/// Implementations must:
/// - scope every operation to the key's tenant
/// - reject an insert whose id or unique key already exists with `Duplicate`
/// - check `ExpectedVersion` and bump the version atomically with the write
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
    ) -> Result<StoredDocument, StoreError>;

    /// Whole-document replace.
    async fn replace(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError>;

    /// Narrow update: merges top-level `fields` into the stored body.
    async fn patch(
        &self,
        key: DocumentKey,
        fields: Map<String, JsonValue>,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError>;

    async fn get(&self, key: DocumentKey) -> Result<Option<StoredDocument>, StoreError>;

    /// All documents of a tenant's collection, oldest first.
    async fn list(
        &self,
        tenant_id: TenantId,
        collection: &'static str,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Hard delete. Returns whether a document was removed.
    async fn delete(&self, key: DocumentKey) -> Result<bool, StoreError>;

    /// Next value of a per-tenant counter, starting at 1.
    async fn next_sequence(&self, tenant_id: TenantId, name: &str) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn insert(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
    ) -> Result<StoredDocument, StoreError> {
        (**self).insert(key, unique_key, body).await
    }

    async fn replace(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        (**self).replace(key, unique_key, body, expected).await
    }

    async fn patch(
        &self,
        key: DocumentKey,
        fields: Map<String, JsonValue>,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        (**self).patch(key, fields, expected).await
    }

    async fn get(&self, key: DocumentKey) -> Result<Option<StoredDocument>, StoreError> {
        (**self).get(key).await
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        collection: &'static str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).list(tenant_id, collection).await
    }

    async fn delete(&self, key: DocumentKey) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    async fn next_sequence(&self, tenant_id: TenantId, name: &str) -> Result<u64, StoreError> {
        (**self).next_sequence(tenant_id, name).await
    }
}
