//! `invoicefy-auth`: authentication and authorization boundary.
//!
//! Accounts, password hashing, HS256 tokens and the permission check.
//! Decoupled from HTTP and storage.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use account::{Account, normalize_email};
pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator, issue_token};
pub use password::{DEFAULT_COST, MIN_PASSWORD_LEN, PasswordError, hash_password, validate_password, verify_password};
pub use permissions::Permission;
pub use principal::TenantMembership;
pub use roles::Role;
