use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use invoicefy_auth::Permission;
use invoicefy_parties::ShopProfileDetails;

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new().route("/", get(get_shop).put(update_shop))
}

pub async fn get_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.shop.get(tenant.tenant_id()).await {
        Ok(profile) => (StatusCode::OK, Json(dto::shop_to_json(&profile))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ShopProfileDetails>,
) -> axum::response::Response {
    let details = match CmdAuth::new(body, Permission::SHOP_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.shop.update(tenant.tenant_id(), details).await {
        Ok(profile) => (StatusCode::OK, Json(dto::shop_to_json(&profile))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
