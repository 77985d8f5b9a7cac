//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash passwords, mint and verify bearer tokens, and decide whether a resolved
//! identity may reach a route. Persistence of accounts lives in `storefront-infra`.

pub mod access;
pub mod account;
pub mod claims;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use access::{AccessError, AccessOutcome, Identity, check_access};
pub use account::{Account, NewAccount};
pub use claims::{TokenClaims, TokenError, validate_claims};
pub use password::{BcryptHasher, PasswordError, PasswordHasher};
pub use policy::{AccessPolicy, Requirement, RoutePattern};
pub use roles::Role;
pub use token::{IssuedToken, TokenService};
