use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use storefront_auth::{AccessError, AccessOutcome, AccessPolicy, TokenService, check_access};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AccessState {
    pub policy: Arc<AccessPolicy>,
    pub tokens: Arc<TokenService>,
}

/// Gate every request on the policy table before it reaches a handler.
///
/// Public routes pass untouched. Everything else needs a verified bearer token
/// whose roles satisfy the route; the resolved identity is attached as a
/// [`PrincipalContext`] extension.
pub async fn access_middleware(
    State(state): State<AccessState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let bearer = extract_bearer(req.headers());

    match check_access(&state.policy, &state.tokens, &path, bearer, Utc::now()) {
        Ok(AccessOutcome::Public) => next.run(req).await,
        Ok(AccessOutcome::Granted(identity)) => {
            req.extensions_mut().insert(PrincipalContext::from(identity));
            next.run(req).await
        }
        Err(err) => {
            debug!(%path, error = %err, "request rejected by access policy");
            access_error_to_response(err)
        }
    }
}

fn access_error_to_response(err: AccessError) -> Response {
    if err.is_unauthenticated() {
        errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
    } else {
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient role for this resource")
    }
}

/// The token of an `Authorization: Bearer <token>` header, if well-formed.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
