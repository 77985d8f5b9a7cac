//! One-shot startup actions.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use storefront_auth::{NewAccount, PasswordError, PasswordHasher, Role};

use crate::deadline::with_deadline;
use crate::store::{CredentialStore, StoreError};
use crate::ServiceError;

/// Credentials of the administrator created on first start.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@local".to_string(),
            password: "adminpass".to_string(),
        }
    }
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Create the administrator account unless one with that username exists.
///
/// Returns whether an account was created. Safe to call on every start, and
/// safe when several instances start at once: losing the insert race counts
/// as "already present". Each store call is bounded by `store_timeout`.
pub async fn ensure_admin<C>(
    store: &C,
    hasher: Arc<dyn PasswordHasher>,
    seed: &AdminSeed,
    store_timeout: Duration,
) -> Result<bool, ServiceError>
where
    C: CredentialStore + ?Sized,
{
    let exists = with_deadline(
        store_timeout,
        "exists_by_username",
        store.exists_by_username(&seed.username),
    )
    .await
    .map_err(|e| e.into_service("Account"))?;
    if exists {
        info!(username = %seed.username, "admin account already present");
        return Ok(false);
    }

    let password = seed.password.clone();
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| match e {
            PasswordError::Empty => ServiceError::Internal("admin password is empty".to_string()),
            other => ServiceError::Internal(other.to_string()),
        })?;

    let account = NewAccount::new(&seed.username, &seed.email, hash, Role::admin_set())?;
    match with_deadline(store_timeout, "insert_account", store.insert(account)).await {
        Ok(account) => {
            info!(username = %account.username, account_id = %account.id, "admin account created");
            Ok(true)
        }
        Err(StoreError::Duplicate { field }) => {
            info!(username = %seed.username, field, "admin account created concurrently");
            Ok(false)
        }
        Err(e) => Err(e.into_service("Account")),
    }
}
