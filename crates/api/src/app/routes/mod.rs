use axum::{Router, routing::get};

pub mod auth;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod products;
pub mod shop;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/customers", customers::router())
        .nest("/products", products::router())
        .nest("/invoices", invoices::router())
        .nest("/shop", shop::router())
        .nest("/dashboard", dashboard::router())
}
