//! Parties domain module: the tenant's customers and its own shop profile.
//!
//! Flat records with light validation, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod contact;
pub mod customer;
pub mod shop;

pub use contact::ContactInfo;
pub use customer::{Customer, CustomerDetails, CustomerId};
pub use shop::{ShopProfile, ShopProfileDetails};
