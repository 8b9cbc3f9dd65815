//! Save-time validation.
//!
//! Runs before every create and update. Client-submitted totals are never
//! trusted: line amounts and the totals tuple are re-derived here.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use invoicefy_core::TenantId;
use invoicefy_core::error::optional_text;
use invoicefy_parties::{Customer, CustomerId};

use crate::error::{InvoiceError, InvoiceResult};
use crate::invoice::{CustomerSnapshot, InvoiceDraft};
use crate::line_item::{LineItem, LineItemDraft};
use crate::money::{Percentage, Totals, compute_totals};
use crate::numbering::normalize_invoice_number;

/// Items, percentages and the totals derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    pub items: Vec<LineItem>,
    pub discount_percentage: Percentage,
    pub tax_percentage: Percentage,
    pub totals: Totals,
}

/// A draft that passed validation, ready to become (or update) an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInvoice {
    pub customer_id: CustomerId,
    pub customer: CustomerSnapshot,
    pub invoice_number: Option<String>,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub priced: PricedItems,
    pub notes: Option<String>,
}

/// Validate items and percentages and compute totals.
///
/// Also backs the preview endpoint, which prices a draft without a customer.
pub fn price_items(
    items: Vec<LineItemDraft>,
    discount_percentage: Decimal,
    tax_percentage: Decimal,
) -> InvoiceResult<PricedItems> {
    if items.is_empty() {
        return Err(InvoiceError::EmptyItems);
    }

    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, draft)| LineItem::from_draft(index, draft))
        .collect::<InvoiceResult<Vec<_>>>()?;

    let discount_percentage = Percentage::parse("discount_percentage", discount_percentage)?;
    let tax_percentage = Percentage::parse("tax_percentage", tax_percentage)?;
    let totals = compute_totals(items.iter().map(LineItem::pricing), discount_percentage, tax_percentage)?;

    Ok(PricedItems {
        items,
        discount_percentage,
        tax_percentage,
        totals,
    })
}

/// Validate a draft for create/update.
///
/// `customer` is the result of looking up `draft.customer_id`; a customer of
/// another tenant counts as missing.
pub fn validate_for_save(
    tenant_id: TenantId,
    draft: InvoiceDraft,
    customer: Option<&Customer>,
) -> InvoiceResult<ValidatedInvoice> {
    let customer_id = draft.customer_id.ok_or(InvoiceError::MissingCustomer)?;
    let customer = customer
        .filter(|c| c.id_typed() == customer_id && c.tenant_id() == tenant_id)
        .ok_or(InvoiceError::MissingCustomer)?;

    let priced = price_items(draft.items, draft.discount_percentage, draft.tax_percentage)?;

    Ok(ValidatedInvoice {
        customer_id,
        customer: CustomerSnapshot::from(customer),
        invoice_number: normalize_invoice_number(draft.invoice_number),
        invoice_date: draft.invoice_date,
        due_date: draft.due_date,
        priced,
        notes: optional_text(draft.notes),
    })
}
