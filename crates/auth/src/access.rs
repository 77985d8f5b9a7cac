//! Per-request access decision.
//!
//! Each protected request goes `NoToken → TokenPresent → {Verified, Rejected}`:
//!
//! - public routes skip straight through, whatever the token state;
//! - a missing or invalid token is `Unauthenticated`;
//! - a verified identity whose roles miss the route's requirement is `Forbidden`.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{AccessPolicy, Requirement, Role, TokenError, TokenService};

/// A verified caller: who they are and what roles their token carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject: String,
    roles: BTreeSet<Role>,
}

impl Identity {
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

    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.iter().any(|r| self.roles.contains(r))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("authentication required")]
    MissingToken,

    #[error("invalid bearer token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("forbidden: '{path}' requires one of {required:?}")]
    Forbidden { path: String, required: Vec<String> },
}

impl AccessError {
    /// Whether this is an authentication (401) rather than authorization (403) failure.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AccessError::MissingToken | AccessError::InvalidToken(_))
    }
}

/// Result of letting a request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Public route: no identity was required or resolved.
    Public,
    /// Protected route: the verified identity to attach to the request.
    Granted(Identity),
}

/// Decide whether a request for `path` carrying `bearer` may proceed.
pub fn check_access(
    policy: &AccessPolicy,
    tokens: &TokenService,
    path: &str,
    bearer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AccessOutcome, AccessError> {
    let requirement = policy.resolve(path);
    if *requirement == Requirement::Public {
        return Ok(AccessOutcome::Public);
    }

    let token = bearer.ok_or(AccessError::MissingToken)?;
    let identity = tokens.verify_at(token, now)?;

    match requirement {
        Requirement::Public | Requirement::Authenticated => Ok(AccessOutcome::Granted(identity)),
        Requirement::AnyRole(required) if identity.has_any_role(required) => {
            Ok(AccessOutcome::Granted(identity))
        }
        Requirement::AnyRole(required) => Err(AccessError::Forbidden {
            path: path.to_string(),
            required: required.iter().map(|r| r.as_str().to_string()).collect(),
        }),
        Requirement::Deny => Err(AccessError::Forbidden {
            path: path.to_string(),
            required: Vec::new(),
        }),
    }
}
