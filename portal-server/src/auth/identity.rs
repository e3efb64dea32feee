//! Caller Identity
//!
//! Explicit sum type produced at the authentication boundary. Gates
//! never inspect raw user fields — the two-nullable-field legacy check
//! (`role = 'admin'` with no `role_id`) is folded into the variant once,
//! at resolution time.

use std::collections::HashSet;

use shared::models::User;

/// Resolved caller identity for one authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// Unconditional authorization; bypasses all permission checks
    SuperAdmin { user_id: i64 },
    /// Permissions resolved through user → role → role_permission
    RoleBound {
        user_id: i64,
        role_id: i64,
        can_create_roles: bool,
        permissions: HashSet<String>,
    },
    /// No role and not legacy admin — the empty permission set,
    /// denied by default
    Unprivileged { user_id: i64 },
}

impl CallerIdentity {
    pub fn user_id(&self) -> i64 {
        match self {
            CallerIdentity::SuperAdmin { user_id }
            | CallerIdentity::RoleBound { user_id, .. }
            | CallerIdentity::Unprivileged { user_id } => *user_id,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, CallerIdentity::SuperAdmin { .. })
    }

    /// Delegated authority to mint new roles
    pub fn can_create_roles(&self) -> bool {
        match self {
            CallerIdentity::SuperAdmin { .. } => true,
            CallerIdentity::RoleBound {
                can_create_roles, ..
            } => *can_create_roles,
            CallerIdentity::Unprivileged { .. } => false,
        }
    }

    /// Exact-match permission check, fail closed
    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            CallerIdentity::SuperAdmin { .. } => true,
            CallerIdentity::RoleBound { permissions, .. } => permissions.contains(permission),
            CallerIdentity::Unprivileged { .. } => false,
        }
    }

    /// 检查是否拥有任一指定权限
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    /// Sorted permission slugs (for login / me responses)
    pub fn permission_slugs(&self) -> Vec<String> {
        match self {
            CallerIdentity::RoleBound { permissions, .. } => {
                let mut slugs: Vec<String> = permissions.iter().cloned().collect();
                slugs.sort();
                slugs
            }
            _ => Vec::new(),
        }
    }

    pub fn role_id(&self) -> Option<i64> {
        match self {
            CallerIdentity::RoleBound { role_id, .. } => Some(*role_id),
            _ => None,
        }
    }

    /// Classify a user row into an identity, given its resolved
    /// permission data (empty for users without a role)
    pub fn classify(user: &User, can_create_roles: bool, permissions: HashSet<String>) -> Self {
        if !user.is_active {
            return CallerIdentity::Unprivileged { user_id: user.id };
        }
        match user.role_id {
            None if user.is_legacy_super_admin() => {
                CallerIdentity::SuperAdmin { user_id: user.id }
            }
            Some(role_id) => CallerIdentity::RoleBound {
                user_id: user.id,
                role_id,
                can_create_roles,
                permissions,
            },
            None => CallerIdentity::Unprivileged { user_id: user.id },
        }
    }
}
