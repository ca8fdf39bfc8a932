use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings on the wire; `permissions` maps the two roles the
/// facility uses onto concrete permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Day-to-day staff: catalog upkeep, entries, exits, relocations, reports.
    pub const OPERATOR: Role = Role(Cow::Borrowed("operator"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == "admin"
    }

    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![Permission::new("*")],
            "operator" => vec![
                Permission::CATALOG_READ,
                Permission::CATALOG_WRITE,
                Permission::STOCK_READ,
                Permission::STOCK_WRITE,
                Permission::MOVEMENTS_READ,
                Permission::REPORTS_READ,
            ],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Union of the permissions granted by `roles`.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut perms: Vec<Permission> = roles.iter().flat_map(Role::permissions).collect();
    perms.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    perms.dedup();
    perms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_wildcard_and_unknown_roles_grant_nothing() {
        assert!(Role::ADMIN.permissions().iter().any(Permission::is_wildcard));
        assert!(Role::new("visitor").permissions().is_empty());
    }

    #[test]
    fn operator_cannot_manage_operators() {
        let perms = permissions_from_roles(&[Role::OPERATOR]);
        assert!(perms.contains(&Permission::STOCK_WRITE));
        assert!(!perms.contains(&Permission::OPERATORS_MANAGE));
    }
}
