use axum::{
    Router,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::app::errors;

pub mod auth;
pub mod items;
pub mod system;
pub mod users;

/// Router for every endpoint. Access control is applied around it by the
/// access middleware, including the fallback.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::health))
        .route("/health", get(system::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/me", get(users::me))
        .route("/api/items/all", get(items::list_all))
        .route("/api/items/search", get(items::search))
        .route("/api/items/add", post(items::create))
        .route("/api/items/update/:id", put(items::update))
        .route("/api/items/delete/:id", delete(items::delete))
        .route("/api/items/purchase/:id", post(items::purchase))
        .route("/api/items/restock/:id", post(items::restock))
        .route("/api/items/:id", get(items::get_item))
        .fallback(not_found)
}

async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such route")
}
