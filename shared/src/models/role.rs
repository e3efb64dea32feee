//! Role Model

use serde::{Deserialize, Serialize};

use super::permission::Permission;

/// Department tags (固定枚举) used to classify roles and permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Users,
    Roles,
    Orders,
    Products,
    Tickets,
    Settings,
    Content,
}

impl Department {
    pub const ALL: &'static [Department] = &[
        Department::Users,
        Department::Roles,
        Department::Orders,
        Department::Products,
        Department::Tickets,
        Department::Settings,
        Department::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Users => "users",
            Department::Roles => "roles",
            Department::Orders => "orders",
            Department::Products => "products",
            Department::Tickets => "tickets",
            Department::Settings => "settings",
            Department::Content => "content",
        }
    }

    pub fn parse(value: &str) -> Option<Department> {
        Department::ALL.iter().copied().find(|d| d.as_str() == value)
    }
}

/// Role entity
///
/// `slug` is derived deterministically from `name` and unique; system
/// roles are seeded and protected from non-super-admin edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub is_system: bool,
    /// Delegated authority to mint new roles
    pub can_create_roles: bool,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub can_create_roles: bool,
    /// Permission slugs to assign (filtered against the seeded catalog)
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Update role payload
///
/// `permissions`, when present, replaces the role's assignment set
/// wholesale — there is no incremental add/remove.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub can_create_roles: Option<bool>,
    pub permissions: Option<Vec<String>>,
}

/// Role with user count and assigned permission slugs (list view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
    #[serde(flatten)]
    pub role: Role,
    pub user_count: i64,
    pub permissions: Vec<String>,
}

/// Role with full permission detail (single-role view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub user_count: i64,
    pub permissions: Vec<Permission>,
}
