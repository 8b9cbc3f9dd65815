//! Aggregate root trait and optimistic versioning for stored records.

use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
///
/// Implemented by every record that is persisted as a whole document
/// (invoices, customers, products). The version is what optimistic
/// concurrency checks compare against.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the stored record.
    ///
    /// `0` means "never persisted"; the store assigns `1` on first write and
    /// increments on every subsequent write.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ExpectedVersion {
    /// Skip version checking (last write wins).
    #[default]
    Any,
    /// Require the stored record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Build an expectation from an optional client-supplied version token.
    pub fn from_token(token: Option<u64>) -> Self {
        match token {
            Some(v) => ExpectedVersion::Exact(v),
            None => ExpectedVersion::Any,
        }
    }

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
