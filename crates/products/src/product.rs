use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use invoicefy_core::error::{optional_text, require_text};
use invoicefy_core::{AggregateId, AggregateRoot, DomainError, DomainResult, TenantId};

/// Unit used when a product does not name one.
pub const DEFAULT_UNIT: &str = "pcs";

/// Product identifier (tenant-scoped via the `tenant_id` field).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Editable catalog fields, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    name: String,
    description: Option<String>,
    /// Unit price, 2 fractional digits.
    price: Decimal,
    unit: String,
    sku: Option<String>,
    #[serde(default)]
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(
        tenant_id: TenantId,
        id: ProductId,
        details: ProductDetails,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let (name, description, price, unit, sku) = Self::validate(details)?;
        Ok(Self {
            id,
            tenant_id,
            name,
            description,
            price,
            unit,
            sku,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields. Existing invoice lines are unaffected:
    /// they hold their own copy of the price.
    pub fn update(&mut self, details: ProductDetails, now: DateTime<Utc>) -> DomainResult<()> {
        let (name, description, price, unit, sku) = Self::validate(details)?;
        self.name = name;
        self.description = description;
        self.price = price;
        self.unit = unit;
        self.sku = sku;
        self.updated_at = now;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn validate(
        details: ProductDetails,
    ) -> DomainResult<(String, Option<String>, Decimal, String, Option<String>)> {
        let name = require_text("name", &details.name)?;
        if details.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let mut price = details
            .price
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        price.rescale(2);
        let unit = optional_text(details.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string());
        Ok((name, optional_text(details.description), price, unit, optional_text(details.sku)))
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
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

impl AggregateRoot for Product {
    type Id = ProductId;

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

    fn details(price: Decimal) -> ProductDetails {
        ProductDetails {
            name: "Consulting hour".to_string(),
            description: Some("Senior engineer".to_string()),
            price,
            unit: None,
            sku: Some(" SKU-1 ".to_string()),
        }
    }

    #[test]
    fn create_defaults_unit_and_fixes_price_scale() {
        let product = Product::create(
            TenantId::new(),
            ProductId::new(AggregateId::new()),
            details(Decimal::new(120, 0)),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(product.unit(), DEFAULT_UNIT);
        assert_eq!(product.price().to_string(), "120.00");
        assert_eq!(product.sku(), Some("SKU-1"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = Product::create(
            TenantId::new(),
            ProductId::new(AggregateId::new()),
            details(Decimal::new(-1, 2)),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::Validation("price cannot be negative".to_string()));
    }

    #[test]
    fn price_accepts_json_number_or_string() {
        let from_number: ProductDetails =
            serde_json::from_str(r#"{"name":"Bolt","price":2.5}"#).unwrap();
        let from_string: ProductDetails =
            serde_json::from_str(r#"{"name":"Bolt","price":"2.50"}"#).unwrap();
        assert_eq!(from_number.price, from_string.price);
    }
}
