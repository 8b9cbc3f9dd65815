//! `invoicefy-core`: domain foundation building blocks.
//!
//! Pure primitives shared by every domain crate: identifiers, the domain error
//! model, record versioning and value objects. No infrastructure concerns.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use value_object::ValueObject;
