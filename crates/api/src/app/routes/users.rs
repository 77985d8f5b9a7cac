use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::{AppState, dto, errors};
use crate::context::PrincipalContext;

/// Profile of the caller.
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match state.auth.account(principal.subject()).await {
        Ok(account) => Json(dto::ProfileResponse::from(account)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
