//! Typed access to the document store.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use invoicefy_core::{AggregateId, ExpectedVersion, TenantId};
use invoicefy_invoicing::Invoice;
use invoicefy_parties::{Customer, ShopProfile};
use invoicefy_products::Product;

use super::{DocumentKey, DocumentStore, StoreError, StoredDocument};

/// Collection names.
pub mod collections {
    pub const CUSTOMERS: &str = "customers";
    pub const PRODUCTS: &str = "products";
    pub const INVOICES: &str = "invoices";
    pub const SHOP_PROFILES: &str = "shop_profiles";
}

/// A record that is persisted as one document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn tenant_id(&self) -> TenantId;

    fn document_id(&self) -> AggregateId;

    /// Value that must be unique within the tenant's collection.
    fn unique_key(&self) -> Option<String> {
        None
    }

    /// Record the version assigned by the store.
    fn set_version(&mut self, _version: u64) {}
}

impl Document for Customer {
    const COLLECTION: &'static str = collections::CUSTOMERS;

    fn tenant_id(&self) -> TenantId {
        Customer::tenant_id(self)
    }

    fn document_id(&self) -> AggregateId {
        self.id_typed().0
    }

    fn set_version(&mut self, version: u64) {
        Customer::set_version(self, version)
    }
}

impl Document for Product {
    const COLLECTION: &'static str = collections::PRODUCTS;

    fn tenant_id(&self) -> TenantId {
        Product::tenant_id(self)
    }

    fn document_id(&self) -> AggregateId {
        self.id_typed().0
    }

    fn set_version(&mut self, version: u64) {
        Product::set_version(self, version)
    }
}

impl Document for Invoice {
    const COLLECTION: &'static str = collections::INVOICES;

    fn tenant_id(&self) -> TenantId {
        Invoice::tenant_id(self)
    }

    fn document_id(&self) -> AggregateId {
        self.id_typed().0
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.invoice_number().to_string())
    }

    fn set_version(&mut self, version: u64) {
        Invoice::set_version(self, version)
    }
}

/// One profile per tenant, stored under the tenant's own id.
impl Document for ShopProfile {
    const COLLECTION: &'static str = collections::SHOP_PROFILES;

    fn tenant_id(&self) -> TenantId {
        ShopProfile::tenant_id(self)
    }

    fn document_id(&self) -> AggregateId {
        shop_profile_id(ShopProfile::tenant_id(self))
    }
}

pub fn shop_profile_id(tenant_id: TenantId) -> AggregateId {
    AggregateId::from_uuid(*tenant_id.as_uuid())
}

/// Serde layer over a [`DocumentStore`] for one document type.
pub struct Repository<D> {
    store: Arc<dyn DocumentStore>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D: Document> Repository<D> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _doc: PhantomData,
        }
    }

    fn key(tenant_id: TenantId, id: AggregateId) -> DocumentKey {
        DocumentKey::new(tenant_id, D::COLLECTION, id)
    }

    fn key_of(doc: &D) -> DocumentKey {
        Self::key(doc.tenant_id(), doc.document_id())
    }

    fn decode(stored: StoredDocument) -> Result<D, StoreError> {
        let mut doc: D = serde_json::from_value(stored.body)?;
        doc.set_version(stored.version);
        Ok(doc)
    }

    pub async fn get(&self, tenant_id: TenantId, id: AggregateId) -> Result<Option<D>, StoreError> {
        self.store
            .get(Self::key(tenant_id, id))
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<D>, StoreError> {
        self.store
            .list(tenant_id, D::COLLECTION)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn insert(&self, doc: &D) -> Result<D, StoreError> {
        let body = serde_json::to_value(doc)?;
        let stored = self.store.insert(Self::key_of(doc), doc.unique_key(), body).await?;
        Self::decode(stored)
    }

    pub async fn replace(&self, doc: &D, expected: ExpectedVersion) -> Result<D, StoreError> {
        let body = serde_json::to_value(doc)?;
        let stored = self
            .store
            .replace(Self::key_of(doc), doc.unique_key(), body, expected)
            .await?;
        Self::decode(stored)
    }

    /// Narrow update of selected top-level fields of `doc`.
    pub async fn patch(
        &self,
        doc: &D,
        fields: &[&str],
        expected: ExpectedVersion,
    ) -> Result<D, StoreError> {
        let JsonValue::Object(mut body) = serde_json::to_value(doc)? else {
            return Err(StoreError::Serialization(format!(
                "{} documents must serialize to a JSON object",
                D::COLLECTION
            )));
        };
        let mut selected = Map::new();
        for field in fields {
            if let Some(value) = body.remove(*field) {
                selected.insert((*field).to_string(), value);
            }
        }
        let stored = self.store.patch(Self::key_of(doc), selected, expected).await?;
        Self::decode(stored)
    }

    pub async fn delete(&self, tenant_id: TenantId, id: AggregateId) -> Result<bool, StoreError> {
        self.store.delete(Self::key(tenant_id, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;
    use chrono::Utc;
    use invoicefy_core::AggregateRoot;
    use invoicefy_parties::{CustomerDetails, CustomerId};

    fn repo() -> Repository<Customer> {
        Repository::new(Arc::new(InMemoryDocumentStore::new()))
    }

    fn customer(tenant_id: TenantId, name: &str) -> Customer {
        Customer::register(
            tenant_id,
            CustomerId::new(AggregateId::new()),
            CustomerDetails {
                name: name.to_string(),
                ..CustomerDetails::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn versions_come_from_the_store() {
        let repo = repo();
        let tenant = TenantId::new();

        let mut stored = repo.insert(&customer(tenant, "Acme")).await.unwrap();
        assert_eq!(stored.version(), 1);

        stored
            .update(
                CustomerDetails {
                    name: "Acme Ltd".into(),
                    ..CustomerDetails::default()
                },
                Utc::now(),
            )
            .unwrap();
        let stored = repo.replace(&stored, ExpectedVersion::Exact(1)).await.unwrap();
        assert_eq!(stored.version(), 2);

        let loaded = repo.get(tenant, stored.id_typed().0).await.unwrap().unwrap();
        assert_eq!(loaded.name(), "Acme Ltd");
        assert_eq!(loaded.version(), 2);
    }

    #[tokio::test]
    async fn other_tenants_cannot_see_documents() {
        let repo = repo();
        let tenant = TenantId::new();
        let stored = repo.insert(&customer(tenant, "Acme")).await.unwrap();

        assert!(repo.get(TenantId::new(), stored.id_typed().0).await.unwrap().is_none());
        assert!(!repo.delete(TenantId::new(), stored.id_typed().0).await.unwrap());
        assert_eq!(repo.list(tenant).await.unwrap().len(), 1);
    }
}
