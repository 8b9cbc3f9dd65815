use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicefy_core::error::require_text;
use invoicefy_core::{AggregateId, AggregateRoot, DomainResult, TenantId};

use crate::contact::ContactInfo;

/// Customer identifier (tenant-scoped via the `tenant_id` field).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Editable customer fields, as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

/// A customer of the tenant: flat record, no computed invariants beyond a
/// required name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    tenant_id: TenantId,
    name: String,
    contact: ContactInfo,
    #[serde(default)]
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    /// Register a new customer. The record is unversioned until first stored.
    pub fn register(
        tenant_id: TenantId,
        id: CustomerId,
        details: CustomerDetails,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = require_text("name", &details.name)?;
        Ok(Self {
            id,
            tenant_id,
            name,
            contact: details.contact.normalized(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields (whole-record update).
    pub fn update(&mut self, details: CustomerDetails, now: DateTime<Utc>) -> DomainResult<()> {
        self.name = require_text("name", &details.name)?;
        self.contact = details.contact.normalized();
        self.updated_at = now;
        Ok(())
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record the version assigned by the store.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicefy_core::DomainError;

    fn details(name: &str) -> CustomerDetails {
        CustomerDetails {
            name: name.to_string(),
            contact: ContactInfo {
                email: Some("ops@acme.test".to_string()),
                city: Some("Pune".to_string()),
                ..ContactInfo::default()
            },
        }
    }

    #[test]
    fn register_requires_a_name() {
        let err = Customer::register(
            TenantId::new(),
            CustomerId::new(AggregateId::new()),
            details("  "),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Validation("name is required".to_string()));
    }

    #[test]
    fn update_replaces_fields_and_bumps_timestamp() {
        let created = Utc::now();
        let mut customer = Customer::register(
            TenantId::new(),
            CustomerId::new(AggregateId::new()),
            details("Acme"),
            created,
        )
        .unwrap();

        let later = created + chrono::Duration::seconds(5);
        customer
            .update(
                CustomerDetails {
                    name: " Acme Ltd ".to_string(),
                    contact: ContactInfo::default(),
                },
                later,
            )
            .unwrap();

        assert_eq!(customer.name(), "Acme Ltd");
        assert_eq!(customer.contact().email, None);
        assert_eq!(customer.created_at(), created);
        assert_eq!(customer.updated_at(), later);
    }

    #[test]
    fn details_accept_flat_json() {
        let details: CustomerDetails = serde_json::from_str(
            r#"{"name":"Acme","email":"a@acme.test","zip_code":"411001"}"#,
        )
        .unwrap();
        assert_eq!(details.contact.zip_code.as_deref(), Some("411001"));
        assert_eq!(details.contact.phone, None);
    }
}
