//! Permission Model
//!
//! Permissions are seed data: machine slugs of the form
//! `<department>.<action>` (e.g. `users.view`). There is no create API.

use serde::{Deserialize, Serialize};

/// Permission entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub department: String,
    pub description: Option<String>,
}

/// Permissions grouped by department (for the role editor UI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub department: String,
    pub permissions: Vec<Permission>,
}
