use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use invoicefy_auth::PasswordError;
use invoicefy_core::{AggregateId, DomainError};
use invoicefy_infra::services::{AuthError, ServiceError};
use invoicefy_invoicing::{ErrorKind, InvoiceError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn internal_error(code: &'static str, err: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!(error = %err, code, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal server error")
}

pub fn invoice_error_to_response(err: InvoiceError) -> axum::response::Response {
    let code = match &err {
        InvoiceError::EmptyItems => "empty_items",
        InvoiceError::InvalidItem { .. } => "invalid_item",
        InvoiceError::MissingCustomer => "missing_customer",
        InvoiceError::InvalidStatus(_) => "invalid_status",
        InvoiceError::InvalidPercentage { .. } => "invalid_percentage",
        InvoiceError::AmountTooLarge(_) => "amount_too_large",
        InvoiceError::NotFound => "not_found",
        InvoiceError::DuplicateInvoiceNumber(_) => "duplicate_invoice_number",
        InvoiceError::ConflictingUpdate(_) => "conflict",
        InvoiceError::Storage(_) => "storage_error",
    };

    match err.kind() {
        ErrorKind::Validation => json_error(StatusCode::BAD_REQUEST, code, err.to_string()),
        ErrorKind::NotFound => json_error(StatusCode::NOT_FOUND, code, err.to_string()),
        ErrorKind::Conflict => json_error(StatusCode::CONFLICT, code, err.to_string()),
        ErrorKind::Storage => internal_error(code, err),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => internal_error("store_error", e),
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::EmailTaken => json_error(StatusCode::CONFLICT, "email_taken", err.to_string()),
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        AuthError::Password(PasswordError::TooShort) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        AuthError::Domain(e) => domain_error_to_response(e),
        AuthError::Password(PasswordError::Hash(e)) => internal_error("password_error", e),
        AuthError::Token(e) => internal_error("token_error", e),
        AuthError::Store(e) => internal_error("store_error", e),
        AuthError::Task(msg) => internal_error("internal_error", msg),
    }
}

/// Parse a path id; ids of every resource are UUIDs.
pub fn parse_id(raw: &str, what: &'static str) -> Result<AggregateId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
