//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects carry no identity: two instances with the same attributes are
/// interchangeable. Money amounts, percentages and the customer snapshot copied
/// onto an invoice are value objects; customers and invoices are not.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Percentage(Decimal);
///
/// impl ValueObject for Percentage {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
