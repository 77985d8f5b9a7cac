//! Bearer token issuance and verification (HS256 JWT).

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::{Identity, Role, TokenClaims, TokenError, validate_claims};

/// A freshly minted token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies self-contained, signed, time-bound bearer tokens.
///
/// The signing key is fixed at construction and never changes afterwards;
/// share one instance per process behind an `Arc`. Verification needs no
/// server-side lookup and does no IO.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time-window checks are done by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid from now until now + TTL.
    pub fn issue(&self, subject: &str, roles: &BTreeSet<Role>) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, roles, Utc::now())
    }

    /// Issue a token as if the clock read `now` (truncated to whole seconds).
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &BTreeSet<Role>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let issued_at = DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            roles: roles.clone(),
            issued_at,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!(subject, %expires_at, "issued bearer token");

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, structure and time window as of `now`.
    ///
    /// Never panics on hostile input; every failure is a typed [`TokenError`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?;

        validate_claims(&data.claims, now)?;

        Ok(Identity::new(data.claims.sub, data.claims.roles))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        other => TokenError::Malformed(format!("{other:?}")),
    }
}
