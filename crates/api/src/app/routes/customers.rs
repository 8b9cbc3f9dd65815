use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use invoicefy_auth::Permission;
use invoicefy_parties::{CustomerDetails, CustomerId};

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn parse_customer_id(raw: &str) -> Result<CustomerId, axum::response::Response> {
    errors::parse_id(raw, "customer").map(CustomerId::new)
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.customers.list(tenant.tenant_id()).await {
        Ok(customers) => {
            let items = customers.iter().map(dto::customer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.customers.get(tenant.tenant_id(), id).await {
        Ok(customer) => (StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CustomerDetails>,
) -> axum::response::Response {
    let details = match CmdAuth::new(body, Permission::CUSTOMERS_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.customers.create(tenant.tenant_id(), details).await {
        Ok(customer) => (StatusCode::CREATED, Json(dto::customer_to_json(&customer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(body): Json<CustomerDetails>,
) -> axum::response::Response {
    let id = match parse_customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let details = match CmdAuth::new(body, Permission::CUSTOMERS_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .customers
        .update(tenant.tenant_id(), id, details, version.expected())
        .await
    {
        Ok(customer) => (StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = CmdAuth::new((), Permission::CUSTOMERS_WRITE).authorize(&tenant, &principal) {
        return resp;
    }

    match services.customers.delete(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
