use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use storefront_core::{DomainResult, ItemId};

use crate::app::{AppState, dto, errors};
use crate::context::PrincipalContext;

fn parse_id(raw: &str) -> DomainResult<ItemId> {
    raw.parse()
}

macro_rules! try_domain {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => return errors::domain_error_to_response(err),
        }
    };
}

macro_rules! try_body {
    ($e:expr) => {
        match $e {
            Ok(Json(v)) => v,
            Err(rejection) => return errors::rejection_to_response(rejection),
        }
    };
}

pub async fn list_all(Extension(state): Extension<AppState>) -> axum::response::Response {
    match state.inventory.list_all().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search(
    Extension(state): Extension<AppState>,
    params: Result<Query<dto::SearchParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return errors::rejection_to_response(rejection),
    };
    let filter = try_domain!(params.into_filter());

    match state.inventory.search(filter).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = try_domain!(parse_id(&id));
    match state.inventory.get(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::ItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let spec = try_domain!(try_body!(body).into_spec());

    match state.inventory.create(spec).await {
        Ok(item) => {
            info!(by = principal.subject(), item_id = %item.id, "catalog item added");
            Json(item).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    body: Result<Json<dto::ItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = try_domain!(parse_id(&id));
    let spec = try_domain!(try_body!(body).into_spec());

    match state.inventory.update(id, spec).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = try_domain!(parse_id(&id));
    match state.inventory.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn purchase(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    body: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = try_domain!(parse_id(&id));
    let qty = try_domain!(try_body!(body).positive_quantity());

    match state.inventory.purchase(id, qty).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn restock(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    body: Result<Json<dto::QuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = try_domain!(parse_id(&id));
    let qty = try_domain!(try_body!(body).positive_quantity());

    match state.inventory.restock(id, qty).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
