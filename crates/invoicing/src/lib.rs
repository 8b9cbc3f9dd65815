//! Invoicing domain module.
//!
//! Business rules for invoices: money arithmetic, the status lifecycle,
//! line items, save-time validation and numbering. Deterministic domain logic
//! only (no IO, no HTTP, no storage).

pub mod error;
pub mod invoice;
pub mod line_item;
pub mod money;
pub mod numbering;
pub mod stats;
pub mod status;
pub mod validation;

pub use error::{ErrorKind, InvoiceError, InvoiceResult};
pub use invoice::{CustomerSnapshot, Invoice, InvoiceDraft, InvoiceId};
pub use line_item::{LineItem, LineItemDraft};
pub use money::{Percentage, Totals, compute_totals, line_amount, max_amount, round_money};
pub use numbering::{INVOICE_NUMBER_SEQUENCE, format_invoice_number, normalize_invoice_number};
pub use stats::InvoiceStats;
pub use status::InvoiceStatus;
pub use validation::{PricedItems, ValidatedInvoice, price_items, validate_for_save};
