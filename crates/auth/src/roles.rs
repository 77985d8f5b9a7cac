use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are plain strings without any framework prefix ("USER", not
/// "ROLE_USER"). Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Default role of every registered account.
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    /// Catalog administrator.
    pub const ADMIN: Role = Role(Cow::Borrowed("ADMIN"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Role set given to self-registered accounts.
    pub fn default_set() -> BTreeSet<Role> {
        BTreeSet::from([Role::USER])
    }

    /// Role set of the bootstrap administrator.
    pub fn admin_set() -> BTreeSet<Role> {
        BTreeSet::from([Role::ADMIN, Role::USER])
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_compare_equal_to_owned_names() {
        assert_eq!(Role::new(String::from("ADMIN")), Role::ADMIN);
        assert_ne!(Role::new("admin"), Role::ADMIN);
    }

    #[test]
    fn serializes_as_bare_string() {
        let json = serde_json::to_string(&Role::USER).unwrap();
        assert_eq!(json, "\"USER\"");
    }
}
