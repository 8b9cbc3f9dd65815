use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvoiceResult;
use crate::invoice::Invoice;
use crate::money::{bounded, round_money};
use crate::status::InvoiceStatus;

/// Dashboard figures over a tenant's invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStats {
    pub total_invoices: u64,
    pub total_revenue: Decimal,
    pub paid_invoices: u64,
    pub paid_revenue: Decimal,
    pub unpaid_invoices: u64,
    pub overdue_invoices: u64,
    /// Outstanding amount: unpaid plus overdue totals.
    pub unpaid_revenue: Decimal,
}

impl Default for InvoiceStats {
    fn default() -> Self {
        let zero = round_money(Decimal::ZERO);
        Self {
            total_invoices: 0,
            total_revenue: zero,
            paid_invoices: 0,
            paid_revenue: zero,
            unpaid_invoices: 0,
            overdue_invoices: 0,
            unpaid_revenue: zero,
        }
    }
}

impl InvoiceStats {
    /// Fails with `AmountTooLarge` if a revenue sum leaves the money range.
    pub fn from_invoices<'a, I>(invoices: I) -> InvoiceResult<Self>
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut stats = Self::default();
        for invoice in invoices {
            let total = invoice.total();
            stats.total_invoices += 1;
            stats.total_revenue = add_revenue("total_revenue", stats.total_revenue, total)?;
            match invoice.status() {
                InvoiceStatus::Paid => {
                    stats.paid_invoices += 1;
                    stats.paid_revenue = add_revenue("paid_revenue", stats.paid_revenue, total)?;
                }
                InvoiceStatus::Unpaid => stats.unpaid_invoices += 1,
                InvoiceStatus::Overdue => stats.overdue_invoices += 1,
            }
            if invoice.status().is_outstanding() {
                stats.unpaid_revenue = add_revenue("unpaid_revenue", stats.unpaid_revenue, total)?;
            }
        }
        Ok(stats)
    }
}

fn add_revenue(field: &'static str, sum: Decimal, total: Decimal) -> InvoiceResult<Decimal> {
    bounded(field, sum.checked_add(total))
}
