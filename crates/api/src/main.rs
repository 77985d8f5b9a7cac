use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use storefront_api::app::{AppState, SharedCredentialStore, SharedInventoryStore, build_app};
use storefront_auth::{BcryptHasher, PasswordHasher, TokenService};
use storefront_infra::{AppConfig, InMemoryCredentialStore, InMemoryInventoryStore, ensure_admin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    storefront_observability::init(config.log_format);

    for warning in config.insecure_defaults() {
        warn!("{warning}");
    }

    let (credentials, items) = open_stores(&config).await?;

    let hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptHasher::new(config.bcrypt_cost).context("invalid BCRYPT_COST")?);
    let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl));

    ensure_admin(credentials.as_ref(), Arc::clone(&hasher), &config.admin, config.store_timeout)
        .await
        .context("failed to bootstrap the admin account")?;

    let state = AppState::new(credentials, items, hasher, tokens, config.store_timeout)
        .with_frontend_url(config.frontend_url.clone());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn open_stores(config: &AppConfig) -> anyhow::Result<(SharedCredentialStore, SharedInventoryStore)> {
    use storefront_infra::{PostgresCredentialStore, PostgresInventoryStore, connect, migrate};

    let Some(url) = config.database_url.as_deref() else {
        return Ok(in_memory_stores());
    };

    let pool = connect(url, config.store_timeout)
        .await
        .context("failed to connect to Postgres")?;
    migrate(&pool).await.context("failed to apply schema")?;
    info!("using Postgres stores");

    Ok((
        Arc::new(PostgresCredentialStore::new(pool.clone())),
        Arc::new(PostgresInventoryStore::new(pool)),
    ))
}

#[cfg(not(feature = "postgres"))]
async fn open_stores(config: &AppConfig) -> anyhow::Result<(SharedCredentialStore, SharedInventoryStore)> {
    if config.database_url.is_some() {
        warn!("DATABASE_URL is set but this build has no Postgres support; using in-memory stores");
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (SharedCredentialStore, SharedInventoryStore) {
    info!("using in-memory stores");
    (
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemoryInventoryStore::new()),
    )
}
