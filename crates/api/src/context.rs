use std::collections::BTreeSet;

use storefront_auth::{Identity, Role};

/// Principal context for a request (authenticated identity + roles).
///
/// Only present on routes whose policy required a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    subject: String,
    roles: BTreeSet<Role>,
}

impl PrincipalContext {
    pub fn new(subject: impl Into<String>, roles: BTreeSet<Role>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }
}

impl From<Identity> for PrincipalContext {
    fn from(identity: Identity) -> Self {
        Self::new(identity.subject(), identity.roles().clone())
    }
}
