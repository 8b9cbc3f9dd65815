//! Infrastructure layer: document store, services and configuration.

pub mod config;
pub mod services;
pub mod store;
