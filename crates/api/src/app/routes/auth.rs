use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{AppState, dto, errors};

pub async fn register(
    Extension(state): Extension<AppState>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };

    let username = body.username.unwrap_or_default();
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    match state.auth.register(&username, &email, &password).await {
        Ok(account) => (
            StatusCode::OK,
            Json(dto::RegisterResponse {
                username: account.username,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(state): Extension<AppState>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };

    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    match state.auth.login(&username, &password).await {
        Ok(issued) => Json(dto::AuthResponse::from(issued)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
