use std::sync::Arc;

use axum::{Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::post};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Public routes: these issue the tokens every other route requires.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    match services
        .accounts
        .register(&body.email, &body.password, &body.shop_name)
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(dto::session_to_json(&session.token, &session.account)),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.accounts.login(&body.email, &body.password).await {
        Ok(session) => (
            StatusCode::OK,
            Json(dto::session_to_json(&session.token, &session.account)),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
