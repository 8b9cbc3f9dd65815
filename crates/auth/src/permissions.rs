use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Opaque strings (e.g. "invoices.write"). The wildcard `"*"` allows
/// everything within the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const CUSTOMERS_WRITE: Permission = Permission(Cow::Borrowed("customers.write"));
    pub const PRODUCTS_WRITE: Permission = Permission(Cow::Borrowed("products.write"));
    pub const INVOICES_WRITE: Permission = Permission(Cow::Borrowed("invoices.write"));
    pub const INVOICES_STATUS: Permission = Permission(Cow::Borrowed("invoices.status"));
    pub const INVOICES_DELETE: Permission = Permission(Cow::Borrowed("invoices.delete"));
    pub const SHOP_WRITE: Permission = Permission(Cow::Borrowed("shop.write"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn wildcard() -> Self {
        Self(Cow::Borrowed("*"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
