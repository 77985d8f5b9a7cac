//! One-way salted password hashing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("bcrypt cost must be within 4..=31, got {0}")]
    InvalidCost(u32),

    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Password hashing seam (lets services stay agnostic of the algorithm).
///
/// Implementations are CPU-bound; async callers should run them on a
/// blocking thread.
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted, self-describing hash of `password`.
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check `password` against `hash`. A malformed hash simply fails to verify.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// bcrypt-backed hasher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }
        bcrypt::hash(password, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> BcryptHasher {
        BcryptHasher::new(BcryptHasher::MIN_COST).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = fast();
        let hash = hasher.hash("s3cret").unwrap();

        assert_ne!(hash, "s3cret");
        assert!(hasher.verify("s3cret", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = fast();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        assert!(!fast().verify("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn rejects_out_of_range_cost_and_empty_password() {
        assert_eq!(BcryptHasher::new(3), Err(PasswordError::InvalidCost(3)));
        assert_eq!(fast().hash(""), Err(PasswordError::Empty));
    }
}
