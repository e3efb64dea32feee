//! Permission Repository
//!
//! Permissions are seed data; only lookups live here.

use shared::models::{Permission, PermissionGroup};
use sqlx::SqlitePool;

use super::{RepoResult, retrying};

const COLUMNS: &str = "id, slug, name, department, description";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Permission>> {
    retrying(|| async {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {COLUMNS} FROM permission ORDER BY department, slug"
        ))
        .fetch_all(pool)
        .await?;
        Ok(permissions)
    })
    .await
}

/// All permissions grouped by department, in catalog order
pub async fn grouped(pool: &SqlitePool) -> RepoResult<Vec<PermissionGroup>> {
    let permissions = find_all(pool).await?;

    let mut groups: Vec<PermissionGroup> = Vec::new();
    for permission in permissions {
        match groups.last_mut() {
            Some(group) if group.department == permission.department => {
                group.permissions.push(permission);
            }
            _ => groups.push(PermissionGroup {
                department: permission.department.clone(),
                permissions: vec![permission],
            }),
        }
    }
    Ok(groups)
}

/// Resolve permission rows for the given slugs. Unknown slugs are
/// simply absent from the result — the caller decides whether that is
/// an error.
pub async fn find_by_slugs(pool: &SqlitePool, slugs: &[String]) -> RepoResult<Vec<Permission>> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; slugs.len()].join(", ");
    let sql =
        format!("SELECT {COLUMNS} FROM permission WHERE slug IN ({placeholders}) ORDER BY slug");

    retrying(|| async {
        let mut query = sqlx::query_as::<_, Permission>(&sql);
        for slug in slugs {
            query = query.bind(slug);
        }
        Ok(query.fetch_all(pool).await?)
    })
    .await
}
