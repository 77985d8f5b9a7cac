//! Login and self-registration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use storefront_auth::{Account, IssuedToken, NewAccount, PasswordError, PasswordHasher, Role, TokenService};
use storefront_core::DomainError;

use crate::deadline::with_deadline;
use crate::store::CredentialStore;
use crate::ServiceError;

const ENTITY: &str = "Account";

/// Verified against when the username is unknown, so both rejection paths
/// pay one bcrypt check.
const DUMMY_PASSWORD: &str = "storefront-unknown-account";

/// Authenticates credentials against the credential store and mints tokens.
///
/// Password hashing and verification are CPU-bound; both run on the blocking
/// pool so request workers stay responsive.
pub struct Authenticator<C> {
    store: C,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
    store_timeout: Duration,
    dummy_hash: String,
}

impl<C: CredentialStore> Authenticator<C> {
    pub fn new(
        store: C,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
        store_timeout: Duration,
    ) -> Self {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            warn!(error = %e, "could not precompute the unknown-account hash");
            String::new()
        });
        Self {
            store,
            hasher,
            tokens,
            store_timeout,
            dummy_hash,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Exchange credentials for a bearer token.
    ///
    /// An unknown username and a wrong password fail identically with
    /// `InvalidCredentials`, and both run one hash verification.
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, ServiceError> {
        let account = self.find(username).await?;

        let Some(account) = account else {
            self.verify(password, &self.dummy_hash).await?;
            info!("login rejected");
            return Err(DomainError::InvalidCredentials.into());
        };

        if !self.verify(password, &account.password_hash).await? {
            info!("login rejected");
            return Err(DomainError::InvalidCredentials.into());
        }

        let token = self
            .tokens
            .issue(&account.username, &account.roles)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {e}")))?;
        info!(expires_at = %token.expires_at, "login succeeded");
        Ok(token)
    }

    /// Create a `USER` account.
    ///
    /// The existence pre-check can race with a concurrent registration; the
    /// store's uniqueness constraint decides in that case and the loser still
    /// sees `DuplicateUsername`.
    #[instrument(skip(self, email, password), err)]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Account, ServiceError> {
        NewAccount::check_identity(username, email)?;

        let taken = with_deadline(
            self.store_timeout,
            "exists_by_username",
            self.store.exists_by_username(username),
        )
        .await
        .map_err(|e| e.into_service(ENTITY))?;
        if taken {
            return Err(DomainError::DuplicateUsername.into());
        }

        let hash = self.hash(password).await?;
        let new_account = NewAccount::new(username, email, hash, Role::default_set())?;

        let account = with_deadline(self.store_timeout, "insert_account", self.store.insert(new_account))
            .await
            .map_err(|e| e.into_service(ENTITY))?;
        info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Look up the account behind an authenticated subject.
    pub async fn account(&self, username: &str) -> Result<Account, ServiceError> {
        self.find(username)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY).into())
    }

    async fn find(&self, username: &str) -> Result<Option<Account>, ServiceError> {
        with_deadline(
            self.store_timeout,
            "find_by_username",
            self.store.find_by_username(username),
        )
        .await
        .map_err(|e| e.into_service(ENTITY))
    }

    async fn hash(&self, password: &str) -> Result<String, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| match e {
                PasswordError::Empty => DomainError::validation("Password is required").into(),
                other => ServiceError::Internal(other.to_string()),
            })
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| {
                warn!(error = %e, "verification task failed");
                ServiceError::Internal(format!("verification task failed: {e}"))
            })
    }
}

impl<C> std::fmt::Debug for Authenticator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
