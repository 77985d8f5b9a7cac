//! Route → required-role table for the storefront.
//!
//! Paths are matched without regard to method; the most specific entry wins
//! and anything not listed is denied.

use storefront_auth::{AccessPolicy, Requirement, Role};

pub fn storefront_policy() -> AccessPolicy {
    let shoppers = || Requirement::any_role([Role::USER, Role::ADMIN]);
    let admins = || Requirement::any_role([Role::ADMIN]);

    AccessPolicy::new()
        .exact("/", Requirement::Public)
        .exact("/health", Requirement::Public)
        .exact("/api/auth/register", Requirement::Public)
        .exact("/api/auth/login", Requirement::Public)
        .prefix("/api/users/", Requirement::Authenticated)
        .exact("/api/items/all", Requirement::Public)
        .prefix("/api/items/", shoppers())
        .exact("/api/items/add", admins())
        .prefix("/api/items/update/", admins())
        .prefix("/api/items/delete/", admins())
        .prefix("/api/items/restock/", admins())
        .prefix("/api/items/purchase/", shoppers())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_reads_and_auth_are_public() {
        let policy = storefront_policy();
        for path in ["/", "/health", "/api/auth/login", "/api/auth/register", "/api/items/all"] {
            assert_eq!(policy.resolve(path), &Requirement::Public, "{path}");
        }
    }

    #[test]
    fn writes_need_admin_and_purchase_needs_a_shopper() {
        let policy = storefront_policy();
        let admin = Requirement::any_role([Role::ADMIN]);
        let shopper = Requirement::any_role([Role::USER, Role::ADMIN]);

        assert_eq!(policy.resolve("/api/items/add"), &admin);
        assert_eq!(policy.resolve("/api/items/update/abc"), &admin);
        assert_eq!(policy.resolve("/api/items/delete/abc"), &admin);
        assert_eq!(policy.resolve("/api/items/restock/abc"), &admin);
        assert_eq!(policy.resolve("/api/items/purchase/abc"), &shopper);
        assert_eq!(policy.resolve("/api/items/search"), &shopper);
        assert_eq!(policy.resolve("/api/items/abc"), &shopper);
    }

    #[test]
    fn profile_needs_any_identity_and_the_rest_is_denied() {
        let policy = storefront_policy();
        assert_eq!(policy.resolve("/api/users/me"), &Requirement::Authenticated);
        assert_eq!(policy.resolve("/admin"), &Requirement::Deny);
        assert_eq!(policy.resolve("/api/items"), &Requirement::Deny);
    }
}
