use thiserror::Error;

use storefront_core::DomainError;

/// Failure surfaced by the application services.
///
/// - `Domain`: deterministic business/validation outcome, safe to show the caller.
/// - `Unavailable`: the backing store did not answer in time; retry with backoff.
/// - `Internal`: anything unanticipated; log the detail, report a generic error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
