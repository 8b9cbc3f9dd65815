use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicefy_core::error::{optional_text, require_text};
use invoicefy_core::{DomainResult, TenantId};

use crate::contact::ContactInfo;

/// Editable shop profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfileDetails {
    pub shop_name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Business identity of a tenant, printed on rendered invoices.
///
/// Exactly one per tenant; only `shop_name` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfile {
    tenant_id: TenantId,
    shop_name: String,
    contact: ContactInfo,
    /// Tax identification number.
    gst_number: Option<String>,
    website: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ShopProfile {
    /// Initial profile created at registration time.
    pub fn new(tenant_id: TenantId, shop_name: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            tenant_id,
            shop_name: require_text("shop_name", shop_name)?,
            contact: ContactInfo::default(),
            gst_number: None,
            website: None,
            updated_at: now,
        })
    }

    pub fn update(&mut self, details: ShopProfileDetails, now: DateTime<Utc>) -> DomainResult<()> {
        self.shop_name = require_text("shop_name", &details.shop_name)?;
        self.contact = details.contact.normalized();
        self.gst_number = optional_text(details.gst_number);
        self.website = optional_text(details.website);
        self.updated_at = now;
        Ok(())
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn shop_name(&self) -> &str {
        &self.shop_name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn gst_number(&self) -> Option<&str> {
        self.gst_number.as_deref()
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
