//! Role Repository
//!
//! Multi-table writes (role row + permission assignments) run inside
//! explicit transactions so a failure between the assignment delete and
//! the re-insert can never leave a role with a half-written set.

use std::collections::HashMap;

use shared::models::{Role, RoleCreate, RoleDetail, RoleSummary, RoleUpdate};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, permission, retrying};

const COLUMNS: &str =
    "id, slug, name, description, department, is_system, can_create_roles, created_by, created_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    retrying(|| async {
        let roles =
            sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM role ORDER BY name"))
                .fetch_all(pool)
                .await?;
        Ok(roles)
    })
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    retrying(|| async {
        let role = sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM role WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(role)
    })
    .await
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Role>> {
    retrying(|| async {
        let role =
            sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM role WHERE slug = ?"))
                .bind(slug)
                .fetch_optional(pool)
                .await?;
        Ok(role)
    })
    .await
}

/// Permission slugs assigned to a role
pub async fn permission_slugs(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<String>> {
    retrying(|| async {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT p.slug FROM role_permission rp \
             JOIN permission p ON p.id = rp.permission_id \
             WHERE rp.role_id = ? ORDER BY p.slug",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;
        Ok(slugs)
    })
    .await
}

/// Number of users currently holding a role
pub async fn user_count(pool: &SqlitePool, role_id: i64) -> RepoResult<i64> {
    retrying(|| async {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    })
    .await
}

/// All roles with user counts and assigned permission slugs (list view)
pub async fn summaries(pool: &SqlitePool) -> RepoResult<Vec<RoleSummary>> {
    retrying(|| async {
        let roles =
            sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM role ORDER BY name"))
                .fetch_all(pool)
                .await?;

        let counts: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT role_id, COUNT(*) FROM user WHERE role_id IS NOT NULL GROUP BY role_id",
        )
        .fetch_all(pool)
        .await?;

        let assigned: Vec<(i64, String)> = sqlx::query_as(
            "SELECT rp.role_id, p.slug FROM role_permission rp \
             JOIN permission p ON p.id = rp.permission_id ORDER BY p.slug",
        )
        .fetch_all(pool)
        .await?;

        let counts: HashMap<i64, i64> = counts.into_iter().collect();
        let mut slugs_by_role: HashMap<i64, Vec<String>> = HashMap::new();
        for (role_id, slug) in assigned {
            slugs_by_role.entry(role_id).or_default().push(slug);
        }

        Ok(roles
            .into_iter()
            .map(|role| {
                let user_count = counts.get(&role.id).copied().unwrap_or(0);
                let permissions = slugs_by_role.remove(&role.id).unwrap_or_default();
                RoleSummary {
                    role,
                    user_count,
                    permissions,
                }
            })
            .collect())
    })
    .await
}

/// Single role with full permission detail
pub async fn detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<RoleDetail>> {
    let Some(role) = find_by_id(pool, id).await? else {
        return Ok(None);
    };

    let slugs = permission_slugs(pool, role.id).await?;
    let permissions = permission::find_by_slugs(pool, &slugs).await?;
    let user_count = user_count(pool, role.id).await?;

    Ok(Some(RoleDetail {
        role,
        user_count,
        permissions,
    }))
}

/// Create a role and its permission assignments in one transaction.
///
/// `slug` is pre-derived and `permission_ids` pre-filtered by the
/// caller; this layer owns uniqueness and persistence only.
pub async fn create(
    pool: &SqlitePool,
    data: &RoleCreate,
    slug: &str,
    permission_ids: &[i64],
    can_create_roles: bool,
    created_by: Option<i64>,
) -> RepoResult<Role> {
    let id = retrying(|| async {
        let mut tx = pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM role WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Role slug '{slug}' already exists"
            )));
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO role (slug, name, description, department, is_system, can_create_roles, created_by, created_at) \
             VALUES (?, ?, ?, ?, 0, ?, ?, ?) RETURNING id",
        )
        .bind(slug)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.department)
        .bind(can_create_roles)
        .bind(created_by)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        for permission_id in permission_ids {
            sqlx::query("INSERT INTO role_permission (role_id, permission_id) VALUES (?, ?)")
                .bind(id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    })
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

/// Update a role; a supplied permission set replaces all prior
/// assignments wholesale. System-role protection is caller-aware and
/// enforced at the handler, not here.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: &RoleUpdate,
    slug: Option<&str>,
    permission_ids: Option<&[i64]>,
    can_create_roles: Option<bool>,
) -> RepoResult<Role> {
    retrying(|| async {
        let mut tx = pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM role WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepoError::NotFound(format!("Role {id} not found")));
        }

        if let Some(new_slug) = slug {
            let collision: Option<i64> =
                sqlx::query_scalar("SELECT id FROM role WHERE slug = ? AND id != ?")
                    .bind(new_slug)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if collision.is_some() {
                return Err(RepoError::Duplicate(format!(
                    "Role slug '{new_slug}' already exists"
                )));
            }
        }

        sqlx::query(
            "UPDATE role SET \
                name = COALESCE(?1, name), \
                slug = COALESCE(?2, slug), \
                description = COALESCE(?3, description), \
                department = COALESCE(?4, department), \
                can_create_roles = COALESCE(?5, can_create_roles) \
             WHERE id = ?6",
        )
        .bind(&data.name)
        .bind(slug)
        .bind(&data.description)
        .bind(&data.department)
        .bind(can_create_roles)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(permission_ids) = permission_ids {
            sqlx::query("DELETE FROM role_permission WHERE role_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for permission_id in permission_ids {
                sqlx::query("INSERT INTO role_permission (role_id, permission_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(permission_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    })
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

/// Delete a role. System roles are never deletable; a role still held
/// by users fails with the blocking count.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    retrying(|| async {
        let mut tx = pool.begin().await?;

        let role = sqlx::query_as::<_, Role>(&format!("SELECT {COLUMNS} FROM role WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))?;

        if role.is_system {
            return Err(RepoError::Protected("Cannot delete system roles".into()));
        }

        let holders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE role_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if holders > 0 {
            return Err(RepoError::InUse(holders));
        }

        sqlx::query("DELETE FROM role_permission WHERE role_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM role WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    })
    .await
}
