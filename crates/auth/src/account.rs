//! Account records (credential store rows).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use storefront_core::{AccountId, DomainError, DomainResult};

use crate::Role;

/// A persisted account.
///
/// # Invariants
/// - `username` and `email` are unique across the credential store.
/// - `roles` is never empty.
/// - `password_hash` is a one-way salted hash, never the plain password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

impl Account {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

/// An account about to be inserted; the store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    username: String,
    email: String,
    password_hash: String,
    roles: BTreeSet<Role>,
}

impl NewAccount {
    /// Validate the shape of a new account.
    ///
    /// Uniqueness is not checked here; that is the store's job.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: BTreeSet<Role>,
    ) -> DomainResult<Self> {
        let username = username.into();
        let email = email.into();

        Self::check_identity(&username, &email)?;
        if roles.is_empty() {
            return Err(DomainError::validation("an account needs at least one role"));
        }

        Ok(Self {
            username,
            email,
            password_hash: password_hash.into(),
            roles,
        })
    }

    /// Required-field checks shared with registration, which runs them
    /// before paying for a password hash.
    pub fn check_identity(username: &str, email: &str) -> DomainResult<()> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("Username is required"));
        }
        if email.trim().is_empty() {
            return Err(DomainError::validation("Email is required"));
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Materialize the row once the store has chosen an id.
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
        }
    }
}

impl core::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_username() {
        let err = NewAccount::new("  ", "a@b.c", "h", Role::default_set()).unwrap_err();
        assert_eq!(err, DomainError::validation("Username is required"));
    }

    #[test]
    fn rejects_blank_email() {
        let err = NewAccount::new("alice", "", "h", Role::default_set()).unwrap_err();
        assert_eq!(err, DomainError::validation("Email is required"));
    }

    #[test]
    fn rejects_empty_role_set() {
        assert!(NewAccount::new("alice", "a@b.c", "h", BTreeSet::new()).is_err());
    }

    #[test]
    fn debug_never_prints_the_hash() {
        let account = NewAccount::new("alice", "a@b.c", "$2b$secret", Role::default_set())
            .unwrap()
            .into_account(AccountId::new());
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("$2b$secret"));
        assert!(account.has_role(&Role::USER));
    }
}
