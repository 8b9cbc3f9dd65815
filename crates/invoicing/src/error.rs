use rust_decimal::Decimal;
use thiserror::Error;

pub type InvoiceResult<T> = Result<T, InvoiceError>;

/// Broad class of an [`InvoiceError`], used by callers to pick a response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the caller can correct it and resubmit.
    Validation,
    NotFound,
    /// Retryable: re-fetch and resubmit.
    Conflict,
    /// Generic failure; never retried by the domain.
    Storage,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    #[error("invoice must contain at least one item")]
    EmptyItems,

    #[error("item {index} is invalid: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("customer is missing or does not exist")]
    MissingCustomer,

    #[error("invalid status '{0}': expected one of unpaid, paid, overdue")]
    InvalidStatus(String),

    #[error("{field} must be between 0 and 100 (got {value})")]
    InvalidPercentage { field: &'static str, value: Decimal },

    /// A derived amount left the supported money range.
    #[error("{0} exceeds the largest supported amount")]
    AmountTooLarge(&'static str),

    #[error("invoice not found")]
    NotFound,

    #[error("invoice number '{0}' is already in use")]
    DuplicateInvoiceNumber(String),

    #[error("invoice was modified concurrently: {0}")]
    ConflictingUpdate(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl InvoiceError {
    pub fn invalid_item(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidItem {
            index,
            reason: reason.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InvoiceError::EmptyItems
            | InvoiceError::InvalidItem { .. }
            | InvoiceError::MissingCustomer
            | InvoiceError::InvalidStatus(_)
            | InvoiceError::InvalidPercentage { .. }
            | InvoiceError::AmountTooLarge(_) => ErrorKind::Validation,
            InvoiceError::NotFound => ErrorKind::NotFound,
            InvoiceError::DuplicateInvoiceNumber(_) | InvoiceError::ConflictingUpdate(_) => {
                ErrorKind::Conflict
            }
            InvoiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(InvoiceError::EmptyItems.kind(), ErrorKind::Validation);
        assert_eq!(InvoiceError::invalid_item(2, "x").kind(), ErrorKind::Validation);
        assert_eq!(
            InvoiceError::DuplicateInvoiceNumber("INV-000001".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(InvoiceError::ConflictingUpdate("v".into()).kind(), ErrorKind::Conflict);
        assert_eq!(InvoiceError::storage("down").kind(), ErrorKind::Storage);
        assert_eq!(InvoiceError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(InvoiceError::AmountTooLarge("subtotal").kind(), ErrorKind::Validation);
    }

    #[test]
    fn messages_carry_enough_detail_to_fix_input() {
        let err = InvoiceError::InvalidPercentage {
            field: "tax_percentage",
            value: Decimal::new(1205, 1),
        };
        assert_eq!(err.to_string(), "tax_percentage must be between 0 and 100 (got 120.5)");
        assert_eq!(
            InvoiceError::invalid_item(1, "name is required").to_string(),
            "item 1 is invalid: name is required"
        );
    }
}
