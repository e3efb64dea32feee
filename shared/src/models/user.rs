//! User Model (as consumed by the authorization layer)

use serde::{Deserialize, Serialize};

/// Coarse legacy role values
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// User entity
///
/// Carries both the legacy coarse `role` field and the nullable pointer
/// to a specific [`super::Role`]. A user with `role = "admin"` and no
/// role assignment is the implicit super-admin (legacy bootstrap path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub role_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

impl User {
    /// Implicit super-admin: legacy coarse admin with no specific role
    pub fn is_legacy_super_admin(&self) -> bool {
        self.role == ROLE_ADMIN && self.role_id.is_none()
    }
}

/// User information returned after login / in `me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

/// Row for the admin-users listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AdminUser {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
}

/// Assign (or clear, with `role_id: null`) a user's role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Option<i64>,
}
