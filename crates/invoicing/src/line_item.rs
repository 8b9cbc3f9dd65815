use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use invoicefy_core::error::optional_text;
use invoicefy_products::{DEFAULT_UNIT, Product, ProductId};

use crate::error::{InvoiceError, InvoiceResult};
use crate::money::line_amount;

/// Upper bound accepted for a quantity or a unit price.
fn max_input() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// A line item as submitted by a client.
///
/// `amount` is not part of the draft: whatever the client computed is
/// discarded and re-derived on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDraft {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl LineItemDraft {
    /// Fill the fields the client left empty from a catalog entry.
    ///
    /// The values are copied: later edits to the product do not reach the
    /// invoice.
    pub fn populate_from(&mut self, product: &Product) {
        if self.name.trim().is_empty() {
            self.name = product.name().to_string();
        }
        if self.description.is_none() {
            self.description = product.description().map(str::to_string);
        }
        if self.unit.is_none() {
            self.unit = Some(product.unit().to_string());
        }
        if self.unit_price.is_none() {
            self.unit_price = Some(product.price());
        }
    }
}

/// One priced entry on an invoice. Owned by its invoice.
///
/// Invariant: `amount == round(quantity * unit_price, 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    product_id: Option<ProductId>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    quantity: Decimal,
    unit: String,
    unit_price: Decimal,
    amount: Decimal,
}

impl LineItem {
    /// Validate a draft at position `index` and compute its amount.
    pub fn from_draft(index: usize, draft: LineItemDraft) -> InvoiceResult<Self> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(InvoiceError::invalid_item(index, "name is required"));
        }

        let quantity = draft.quantity;
        if quantity < Decimal::ZERO {
            return Err(InvoiceError::invalid_item(index, "quantity cannot be negative"));
        }
        if quantity > max_input() {
            return Err(InvoiceError::invalid_item(index, "quantity is too large"));
        }

        let unit_price = draft
            .unit_price
            .ok_or_else(|| InvoiceError::invalid_item(index, "unit_price is required"))?;
        if unit_price < Decimal::ZERO {
            return Err(InvoiceError::invalid_item(index, "unit_price cannot be negative"));
        }
        if unit_price > max_input() {
            return Err(InvoiceError::invalid_item(index, "unit_price is too large"));
        }

        Ok(Self {
            product_id: draft.product_id,
            name: name.to_string(),
            description: optional_text(draft.description),
            quantity,
            unit: optional_text(draft.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            unit_price,
            amount: line_amount(quantity, unit_price)?,
        })
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// `(quantity, unit_price)`, the input pair for `compute_totals`.
    pub fn pricing(&self) -> (Decimal, Decimal) {
        (self.quantity, self.unit_price)
    }
}
