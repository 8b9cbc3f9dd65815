use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use invoicefy_auth::Permission;
use invoicefy_core::ExpectedVersion;
use invoicefy_invoicing::{InvoiceDraft, InvoiceId};

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/preview", post(preview_invoice))
        .route(
            "/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/:id/status", patch(update_status))
}

fn parse_invoice_id(raw: &str) -> Result<InvoiceId, axum::response::Response> {
    errors::parse_id(raw, "invoice").map(InvoiceId::new)
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.invoices.list(tenant.tenant_id()).await {
        Ok(invoices) => (StatusCode::OK, Json(invoices)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.invoices.get(tenant.tenant_id(), id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

/// Totals for a draft, computed exactly as a save would. Nothing is stored.
pub async fn preview_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::PreviewRequest>,
) -> axum::response::Response {
    match services
        .invoices
        .preview(tenant.tenant_id(), body.items, body.discount_percentage, body.tax_percentage)
        .await
    {
        Ok(priced) => (StatusCode::OK, Json(dto::preview_to_json(&priced))).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<InvoiceDraft>,
) -> axum::response::Response {
    let draft = match CmdAuth::new(body, Permission::INVOICES_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.invoices.create(tenant.tenant_id(), draft).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(version): Query<dto::VersionQuery>,
    Json(body): Json<InvoiceDraft>,
) -> axum::response::Response {
    let id = match parse_invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft = match CmdAuth::new(body, Permission::INVOICES_WRITE).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .invoices
        .update(tenant.tenant_id(), id, draft, version.expected())
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

/// Narrow update: only `status` (and `updated_at`) change.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::StatusQuery>,
) -> axum::response::Response {
    let id = match parse_invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = match CmdAuth::new(query, Permission::INVOICES_STATUS).authorize(&tenant, &principal) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .invoices
        .set_status(
            tenant.tenant_id(),
            id,
            &query.status,
            ExpectedVersion::from_token(query.expected_version),
        )
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}

pub async fn delete_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = CmdAuth::new((), Permission::INVOICES_DELETE).authorize(&tenant, &principal) {
        return resp;
    }

    match services.invoices.delete(tenant.tenant_id(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::invoice_error_to_response(e),
    }
}
