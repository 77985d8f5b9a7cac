//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use storefront_auth::{AccessPolicy, PasswordHasher, TokenService};
use storefront_infra::{
    Authenticator, CredentialStore, InMemoryCredentialStore, InMemoryInventoryStore, InventoryService,
    InventoryStore,
};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

pub type SharedCredentialStore = Arc<dyn CredentialStore>;
pub type SharedInventoryStore = Arc<dyn InventoryStore>;

/// Everything the handlers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator<SharedCredentialStore>>,
    pub inventory: Arc<InventoryService<SharedInventoryStore>>,
    pub tokens: Arc<TokenService>,
    pub policy: Arc<AccessPolicy>,
    /// Allowed CORS origin; `None` disables the CORS layer.
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(
        credentials: SharedCredentialStore,
        items: SharedInventoryStore,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            auth: Arc::new(Authenticator::new(
                credentials,
                hasher,
                Arc::clone(&tokens),
                store_timeout,
            )),
            inventory: Arc::new(InventoryService::new(items, store_timeout)),
            tokens,
            policy: Arc::new(crate::policy::storefront_policy()),
            frontend_url: None,
        }
    }

    /// State backed by fresh in-memory stores.
    pub fn in_memory(hasher: Arc<dyn PasswordHasher>, tokens: Arc<TokenService>, store_timeout: Duration) -> Self {
        Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryInventoryStore::new()),
            hasher,
            tokens,
            store_timeout,
        )
    }

    pub fn with_frontend_url(mut self, origin: Option<String>) -> Self {
        self.frontend_url = origin;
        self
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    let access_state = middleware::AccessState {
        policy: Arc::clone(&state.policy),
        tokens: Arc::clone(&state.tokens),
    };
    let cors = state.frontend_url.as_deref().and_then(cors_layer);

    let mut app = routes::router()
        .layer(Extension(state))
        .layer(axum::middleware::from_fn_with_state(
            access_state,
            middleware::access_middleware,
        ));

    // Outside the access check so preflight requests are answered without a token.
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin) {
        Ok(origin) => origin,
        Err(_) => {
            tracing::warn!(%origin, "FRONTEND_URL is not a valid origin; CORS disabled");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(Duration::from_secs(3600)),
    )
}
