use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::{Map, Value as JsonValue};

use invoicefy_core::{ExpectedVersion, TenantId};

use super::{DocumentKey, DocumentStore, StoreError, StoredDocument, version_conflict};

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<HashMap<DocumentKey, StoredDocument>>,
    sequences: RwLock<HashMap<(TenantId, String), u64>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// Whether another document of the same tenant/collection holds `unique_key`.
fn unique_key_taken(
    docs: &HashMap<DocumentKey, StoredDocument>,
    key: &DocumentKey,
    unique_key: Option<&str>,
) -> bool {
    let Some(unique_key) = unique_key else {
        return false;
    };
    docs.values().any(|d| {
        d.key.tenant_id == key.tenant_id
            && d.key.collection == key.collection
            && d.key.id != key.id
            && d.unique_key.as_deref() == Some(unique_key)
    })
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
    ) -> Result<StoredDocument, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        if docs.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("document {key} already exists")));
        }
        if unique_key_taken(&docs, &key, unique_key.as_deref()) {
            return Err(StoreError::Duplicate(format!(
                "unique key '{}' already exists in {}",
                unique_key.unwrap_or_default(),
                key.collection
            )));
        }

        let now = Utc::now();
        let doc = StoredDocument {
            key,
            unique_key,
            version: 1,
            body,
            created_at: now,
            updated_at: now,
        };
        docs.insert(key, doc.clone());
        Ok(doc)
    }

    async fn replace(
        &self,
        key: DocumentKey,
        unique_key: Option<String>,
        body: JsonValue,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        let current_version = docs.get(&key).ok_or(StoreError::NotFound)?.version;
        if !expected.matches(current_version) {
            return Err(version_conflict(expected, current_version));
        }
        if unique_key_taken(&docs, &key, unique_key.as_deref()) {
            return Err(StoreError::Duplicate(format!(
                "unique key '{}' already exists in {}",
                unique_key.unwrap_or_default(),
                key.collection
            )));
        }

        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;
        doc.unique_key = unique_key;
        doc.body = body;
        doc.version += 1;
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn patch(
        &self,
        key: DocumentKey,
        fields: Map<String, JsonValue>,
        expected: ExpectedVersion,
    ) -> Result<StoredDocument, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        let doc = docs.get_mut(&key).ok_or(StoreError::NotFound)?;
        if !expected.matches(doc.version) {
            return Err(version_conflict(expected, doc.version));
        }
        let JsonValue::Object(body) = &mut doc.body else {
            return Err(StoreError::Serialization(format!("document {key} is not a JSON object")));
        };
        body.extend(fields);
        doc.version += 1;
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn get(&self, key: DocumentKey) -> Result<Option<StoredDocument>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.get(&key).cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        collection: &'static str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        let mut out: Vec<StoredDocument> = docs
            .values()
            .filter(|d| d.key.tenant_id == tenant_id && d.key.collection == collection)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.key.id.as_uuid().cmp(b.key.id.as_uuid()))
        });
        Ok(out)
    }

    async fn delete(&self, key: DocumentKey) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        Ok(docs.remove(&key).is_some())
    }

    async fn next_sequence(&self, tenant_id: TenantId, name: &str) -> Result<u64, StoreError> {
        let mut sequences = self.sequences.write().map_err(|_| poisoned())?;
        let value = sequences.entry((tenant_id, name.to_string())).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}
