//! Products domain module: the tenant's catalog.
//!
//! Catalog entries are flat records; invoices copy name/price/unit out of them
//! at selection time, so catalog edits never reach existing invoices.

pub mod product;

pub use product::{DEFAULT_UNIT, Product, ProductDetails, ProductId};
