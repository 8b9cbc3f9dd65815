use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use invoicefy_auth::Account;
use invoicefy_core::{AggregateRoot, ExpectedVersion};
use invoicefy_invoicing::{LineItemDraft, PricedItems};
use invoicefy_parties::{ContactInfo, Customer, ShopProfile};
use invoicefy_products::Product;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub shop_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Optimistic concurrency token for writes (`?expected_version=3`).
#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub expected_version: Option<u64>,
}

impl VersionQuery {
    pub fn expected(&self) -> ExpectedVersion {
        ExpectedVersion::from_token(self.expected_version)
    }
}

/// `PATCH /invoices/:id/status?status=paid[&expected_version=N]`
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub items: Vec<LineItemDraft>,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
}

// -------------------------
// Response mapping
// -------------------------

fn contact_fields(contact: &ContactInfo) -> serde_json::Map<String, JsonValue> {
    let mut out = serde_json::Map::new();
    out.insert("email".into(), json!(contact.email));
    out.insert("phone".into(), json!(contact.phone));
    out.insert("address".into(), json!(contact.address));
    out.insert("city".into(), json!(contact.city));
    out.insert("state".into(), json!(contact.state));
    out.insert("zip_code".into(), json!(contact.zip_code));
    out.insert("country".into(), json!(contact.country));
    out
}

pub fn customer_to_json(customer: &Customer) -> JsonValue {
    let mut out = contact_fields(customer.contact());
    out.insert("id".into(), json!(customer.id_typed().to_string()));
    out.insert("name".into(), json!(customer.name()));
    out.insert("version".into(), json!(customer.version()));
    out.insert("created_at".into(), json!(customer.created_at()));
    out.insert("updated_at".into(), json!(customer.updated_at()));
    JsonValue::Object(out)
}

pub fn product_to_json(product: &Product) -> JsonValue {
    json!({
        "id": product.id_typed().to_string(),
        "name": product.name(),
        "description": product.description(),
        "price": product.price(),
        "unit": product.unit(),
        "sku": product.sku(),
        "version": product.version(),
        "created_at": product.created_at(),
        "updated_at": product.updated_at(),
    })
}

pub fn shop_to_json(profile: &ShopProfile) -> JsonValue {
    let mut out = contact_fields(profile.contact());
    out.insert("shop_name".into(), json!(profile.shop_name()));
    out.insert("gst_number".into(), json!(profile.gst_number()));
    out.insert("website".into(), json!(profile.website()));
    out.insert("updated_at".into(), json!(profile.updated_at()));
    JsonValue::Object(out)
}

pub fn preview_to_json(priced: &PricedItems) -> JsonValue {
    json!({
        "items": priced.items,
        "discount_percentage": priced.discount_percentage,
        "tax_percentage": priced.tax_percentage,
        "subtotal": priced.totals.subtotal,
        "discount_amount": priced.totals.discount_amount,
        "tax_amount": priced.totals.tax_amount,
        "total": priced.totals.total,
    })
}

pub fn session_to_json(token: &str, account: &Account) -> JsonValue {
    json!({
        "token": token,
        "user": {
            "id": account.id.to_string(),
            "email": account.email,
            "tenant_id": account.tenant_id.to_string(),
            "roles": account.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        },
    })
}
