//! Money and percentage arithmetic.
//!
//! Every derived monetary value is rounded exactly once, half-up (midpoint
//! away from zero) to 2 fractional digits, and carried with a fixed scale of
//! 2 so that `100` is stored and transmitted as `"100.00"`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use invoicefy_core::ValueObject;

use crate::error::{InvoiceError, InvoiceResult};

/// Fractional digits carried by every monetary value.
pub const MONEY_SCALE: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to 2 dp, half-up, with the scale fixed at 2.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Largest amount any derived money field may hold (10^24).
///
/// Leaves headroom for the percentage product and keeps scale 2
/// representable.
pub fn max_amount() -> Decimal {
    Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_000, 0)
}

pub(crate) fn bounded(field: &'static str, value: Option<Decimal>) -> InvoiceResult<Decimal> {
    value
        .filter(|v| v.abs() <= max_amount())
        .map(round_money)
        .ok_or(InvoiceError::AmountTooLarge(field))
}

/// `round(quantity * unit_price, 2)`.
pub fn line_amount(quantity: Decimal, unit_price: Decimal) -> InvoiceResult<Decimal> {
    bounded("line amount", quantity.checked_mul(unit_price))
}

/// A percentage in `[0, 100]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl ValueObject for Percentage {}

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);

    /// Out-of-range values are rejected, never clamped.
    pub fn parse(field: &'static str, value: Decimal) -> Result<Self, InvoiceError> {
        if value < Decimal::ZERO || value > HUNDRED {
            return Err(InvoiceError::InvalidPercentage { field, value });
        }
        Ok(Self(value.normalize()))
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    /// `round(amount * self / 100, 2)`.
    pub fn of(self, amount: Decimal) -> InvoiceResult<Decimal> {
        bounded(
            "percentage amount",
            amount.checked_mul(self.0).and_then(|v| v.checked_div(HUNDRED)),
        )
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = InvoiceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Percentage::parse("percentage", value)
    }
}

impl From<Percentage> for Decimal {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

/// Derived totals of an invoice. Always produced together by
/// [`compute_totals`]; never assembled field by field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl ValueObject for Totals {}

impl Default for Totals {
    fn default() -> Self {
        let zero = round_money(Decimal::ZERO);
        Self {
            subtotal: zero,
            discount_amount: zero,
            tax_amount: zero,
            total: zero,
        }
    }
}

/// Compute invoice totals from `(quantity, unit_price)` pairs.
///
/// Line amounts are rounded individually and then summed. The discount
/// applies to the subtotal; tax applies to the discounted amount. Any value
/// past [`max_amount`] fails with `AmountTooLarge`.
pub fn compute_totals<I>(lines: I, discount: Percentage, tax: Percentage) -> InvoiceResult<Totals>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let mut subtotal = Decimal::ZERO;
    for (quantity, unit_price) in lines {
        let amount = line_amount(quantity, unit_price)?;
        subtotal = bounded("subtotal", subtotal.checked_add(amount))?;
    }
    let subtotal = round_money(subtotal);
    let discount_amount = discount.of(subtotal)?;
    let taxable = subtotal - discount_amount;
    let tax_amount = tax.of(taxable)?;
    let total = bounded("total", taxable.checked_add(tax_amount))?;

    Ok(Totals {
        subtotal,
        discount_amount,
        tax_amount,
        total,
    })
}
