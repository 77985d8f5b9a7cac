//! Per-row revision counter used for optimistic concurrency.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Monotonically increasing revision of a stored row.
///
/// A freshly created row starts at [`Revision::INITIAL`]; every successful
/// mutation stores `current.next()`. A writer that read revision `R` may only
/// commit while the stored revision is still `R`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    pub const INITIAL: Revision = Revision(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn matches(self, actual: Revision) -> bool {
        self == actual
    }

    /// Fails with [`DomainError::Conflict`] when `actual` moved past `self`.
    pub fn check(self, actual: Revision) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected revision {}, found {})",
                self.0, actual.0
            )))
        }
    }
}

impl core::fmt::Display for Revision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
