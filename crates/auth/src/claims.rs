use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Claims embedded in every bearer token.
///
/// Timestamps travel as whole seconds (`iat`/`exp`, as in RFC 7519).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account's username.
    pub sub: String,

    /// Roles held by the account when the token was issued.
    pub roles: BTreeSet<Role>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp (exclusive).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Why a token was rejected. Every variant means "invalid".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token could not be signed: {0}")]
    Signing(String),

    #[error("token lifetime puts the expiry outside the representable time range")]
    ExpiryOutOfRange,
}

/// Deterministically validate decoded claims against `now`.
///
/// Note: this validates the *claims* only; signature checking happens in
/// [`crate::TokenService`]. A token presented exactly at `expires_at` is expired.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenError::Malformed("empty subject".to_string()));
    }
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}
