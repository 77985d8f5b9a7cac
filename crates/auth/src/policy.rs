//! Static route → required-role policy table.
//!
//! Replaces per-handler role annotations with one table that the access
//! middleware consults before any handler runs.

use std::borrow::Cow;

use crate::Role;

/// What a route demands of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Reachable without a token.
    Public,
    /// Any verified identity.
    Authenticated,
    /// A verified identity holding at least one of these roles.
    AnyRole(Vec<Role>),
    /// Nobody (used for unmatched routes).
    Deny,
}

impl Requirement {
    pub fn any_role(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::AnyRole(roles.into_iter().collect())
    }
}

/// How a rule matches a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// The whole path must be equal.
    Exact(Cow<'static, str>),
    /// The path must start with this prefix.
    Prefix(Cow<'static, str>),
}

impl RoutePattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(p) => path == p.as_ref(),
            RoutePattern::Prefix(p) => path.starts_with(p.as_ref()),
        }
    }

    /// Higher is more specific. Exact matches beat every prefix.
    fn specificity(&self) -> usize {
        match self {
            RoutePattern::Exact(_) => usize::MAX,
            RoutePattern::Prefix(p) => p.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AccessRule {
    pattern: RoutePattern,
    requirement: Requirement,
}

/// Ordered policy table. Unmatched paths resolve to [`Requirement::Deny`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, path: impl Into<Cow<'static, str>>, requirement: Requirement) -> Self {
        self.rules.push(AccessRule {
            pattern: RoutePattern::Exact(path.into()),
            requirement,
        });
        self
    }

    pub fn prefix(mut self, prefix: impl Into<Cow<'static, str>>, requirement: Requirement) -> Self {
        self.rules.push(AccessRule {
            pattern: RoutePattern::Prefix(prefix.into()),
            requirement,
        });
        self
    }

    /// Resolve the requirement for `path`.
    ///
    /// The most specific matching rule wins; among equally specific rules the
    /// one declared first wins.
    pub fn resolve(&self, path: &str) -> &Requirement {
        const DENY: &Requirement = &Requirement::Deny;

        let mut best: Option<&AccessRule> = None;
        for rule in self.rules.iter().filter(|r| r.pattern.matches(path)) {
            match best {
                Some(b) if b.pattern.specificity() >= rule.pattern.specificity() => {}
                _ => best = Some(rule),
            }
        }

        best.map(|r| &r.requirement).unwrap_or(DENY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new()
            .exact("/", Requirement::Public)
            .prefix("/api/items/", Requirement::any_role([Role::USER, Role::ADMIN]))
            .exact("/api/items/all", Requirement::Public)
            .prefix("/api/items/add", Requirement::any_role([Role::ADMIN]))
            .prefix("/api/users/", Requirement::Authenticated)
    }

    #[test]
    fn longest_prefix_wins_regardless_of_declaration_order() {
        let p = policy();
        assert_eq!(p.resolve("/api/items/add"), &Requirement::any_role([Role::ADMIN]));
        assert_eq!(
            p.resolve("/api/items/purchase/1"),
            &Requirement::any_role([Role::USER, Role::ADMIN])
        );
    }

    #[test]
    fn exact_beats_prefix() {
        assert_eq!(policy().resolve("/api/items/all"), &Requirement::Public);
    }

    #[test]
    fn exact_root_does_not_act_as_prefix() {
        assert_eq!(policy().resolve("/admin"), &Requirement::Deny);
    }

    #[test]
    fn unmatched_routes_default_deny() {
        assert_eq!(policy().resolve("/api/secret"), &Requirement::Deny);
        assert_eq!(AccessPolicy::new().resolve("/"), &Requirement::Deny);
    }

    #[test]
    fn first_declared_wins_on_tie() {
        let p = AccessPolicy::new()
            .prefix("/x", Requirement::Public)
            .prefix("/x", Requirement::Deny);
        assert_eq!(p.resolve("/x/y"), &Requirement::Public);
    }
}
