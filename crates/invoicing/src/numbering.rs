//! Invoice number assignment.
//!
//! Numbers come from a per-tenant store sequence; uniqueness itself is
//! enforced by the store.

use invoicefy_core::error::optional_text;

/// Name of the per-tenant sequence that feeds generated numbers.
pub const INVOICE_NUMBER_SEQUENCE: &str = "invoice_number";

/// `INV-000001`. Widens past six digits rather than wrapping.
pub fn format_invoice_number(sequence: u64) -> String {
    format!("INV-{sequence:06}")
}

/// Trim a client-supplied number; blank means "assign one".
pub fn normalize_invoice_number(number: Option<String>) -> Option<String> {
    optional_text(number)
}
