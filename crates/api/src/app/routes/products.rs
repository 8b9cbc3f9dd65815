use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use invoicefy_auth::Permission;
use invoicefy_products::{ProductDetails, ProductId};

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    errors::parse_id(raw, "product").map(ProductId::new)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.products.list(tenant.tenant_id()).await {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.get(tenant.tenant_id(), id).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProductDetails>,
) -> axum::response::Response {
    let details = match CmdAuth::new(body, Permission::PRODUCTS_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.create(tenant.tenant_id(), details).await {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(body): Json<ProductDetails>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match CmdAuth::new(body, Permission::PRODUCTS_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .products
        .update(tenant.tenant_id(), id, details, version.expected())
        .await
    {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = CmdAuth::new((), Permission::PRODUCTS_WRITE).authorize(&tenant, &principal) {
        return resp;
    }

    match services.products.delete(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
