//! Service wiring for the router.

use invoicefy_infra::config::AppConfig;
use invoicefy_infra::store::StoreError;

pub use invoicefy_infra::services::Services as AppServices;

/// Services backed by the store named in `config`.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    AppServices::from_config(config).await
}
