//! Role API Handlers

use std::collections::HashSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use sqlx::SqlitePool;

use crate::auth::{CallerIdentity, permissions};
use crate::core::ServerState;
use crate::db::repository::{permission, role, user};
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    AdminUser, AssignRoleRequest, Department, PermissionGroup, Role, RoleCreate, RoleDetail,
    RoleSummary, RoleUpdate, User,
};
use shared::util::derive_slug;

/// Resolve requested permission slugs to catalog ids, after stripping
/// slugs the caller may not grant. Unknown slugs are a validation
/// error; reserved `roles.*` slugs are silently dropped for
/// non-super-admins (policy, not an error).
async fn resolve_permission_ids(
    pool: &SqlitePool,
    caller: &CallerIdentity,
    requested: &[String],
) -> AppResult<Vec<i64>> {
    let mut slugs = permissions::filter_grantable(caller, requested);
    slugs.sort();
    slugs.dedup();

    let resolved = permission::find_by_slugs(pool, &slugs).await?;
    if resolved.len() != slugs.len() {
        let known: HashSet<&str> = resolved.iter().map(|p| p.slug.as_str()).collect();
        if let Some(missing) = slugs.iter().find(|s| !known.contains(s.as_str())) {
            return Err(AppError::validation(format!(
                "Unknown permission: {missing}"
            )));
        }
    }

    Ok(resolved.into_iter().map(|p| p.id).collect())
}

fn validate_department(department: &Option<String>) -> AppResult<()> {
    if let Some(dep) = department
        && Department::parse(dep).is_none()
    {
        return Err(AppError::validation(format!("Unknown department: {dep}")));
    }
    Ok(())
}

fn derive_checked_slug(name: &str) -> AppResult<String> {
    let slug = derive_slug(name);
    if slug.is_empty() {
        return Err(AppError::validation(
            "name must contain at least one alphanumeric character",
        ));
    }
    Ok(slug)
}

/// GET /api/roles - All roles with user counts and permission slugs
pub async fn list(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
) -> AppResult<Json<Vec<RoleSummary>>> {
    tracing::info!(user_id = %caller.user_id(), "Fetching roles");

    let roles = role::summaries(&state.pool).await?;
    Ok(Json(roles))
}

/// GET /api/roles/permissions - All permissions grouped by department
pub async fn list_permissions(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<PermissionGroup>>> {
    let groups = permission::grouped(&state.pool).await?;
    Ok(Json(groups))
}

/// GET /api/roles/admin-users/list - Users holding any admin role
pub async fn list_admin_users(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<AdminUser>>> {
    let users = user::list_admins(&state.pool).await?;
    Ok(Json(users))
}

/// GET /api/roles/{id} - Single role with full permission detail
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RoleDetail>> {
    let detail = role::detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;

    Ok(Json(detail))
}

/// POST /api/roles - Create a new role
///
/// Requires the delegated `can_create_roles` flag or super-admin. The
/// `can_create_roles` flag on the new role is honored only for
/// super-admin callers.
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    tracing::info!(
        user_id = %caller.user_id(),
        role_name = %payload.name,
        "Creating role"
    );

    if !caller.can_create_roles() {
        return Err(AppError::forbidden("You are not allowed to create roles"));
    }

    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_department(&payload.department)?;
    let slug = derive_checked_slug(&payload.name)?;

    let permission_ids =
        resolve_permission_ids(&state.pool, &caller, &payload.permissions).await?;
    let can_create_roles = caller.is_super_admin() && payload.can_create_roles;

    let created = role::create(
        &state.pool,
        &payload,
        &slug,
        &permission_ids,
        can_create_roles,
        Some(caller.user_id()),
    )
    .await?;

    state.permission_cache.invalidate();

    tracing::info!(role_id = %created.id, slug = %created.slug, "Role created");
    Ok(Json(created))
}

/// PUT /api/roles/{id} - Update a role
///
/// System roles are editable by super-admins only. A supplied
/// permission list replaces the assignment set wholesale.
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    tracing::info!(
        user_id = %caller.user_id(),
        role_id = %id,
        "Updating role"
    );

    let existing = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;

    if existing.is_system && !caller.is_super_admin() {
        return Err(AppError::forbidden("Cannot modify system roles"));
    }

    let slug = match &payload.name {
        Some(name) => {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            Some(derive_checked_slug(name)?)
        }
        None => None,
    };
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_department(&payload.department)?;

    let permission_ids = match &payload.permissions {
        Some(requested) => {
            Some(resolve_permission_ids(&state.pool, &caller, requested).await?)
        }
        None => None,
    };

    // Delegation changes are super-admin-governed
    let can_create_roles = if caller.is_super_admin() {
        payload.can_create_roles
    } else {
        None
    };

    let updated = role::update(
        &state.pool,
        id,
        &payload,
        slug.as_deref(),
        permission_ids.as_deref(),
        can_create_roles,
    )
    .await?;

    state.permission_cache.invalidate();

    Ok(Json(updated))
}

/// DELETE /api/roles/{id} - Delete a role
///
/// Super-admin only (gated at the router). Fails for system roles and
/// for roles still held by users (the error carries the count).
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        user_id = %caller.user_id(),
        role_id = %id,
        "Deleting role"
    );

    let result = role::delete(&state.pool, id).await?;
    state.permission_cache.invalidate();

    Ok(Json(result))
}

/// PUT /api/roles/assign/{user_id} - Assign or clear a user's role
///
/// Assigning a system role requires super-admin. `role_id: null`
/// demotes the user back to the non-privileged default.
pub async fn assign_role(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AssignRoleRequest>,
) -> AppResult<Json<User>> {
    tracing::info!(
        user_id = %caller.user_id(),
        target_user_id = %user_id,
        role_id = ?payload.role_id,
        "Assigning role"
    );

    if let Some(role_id) = payload.role_id {
        let target = role::find_by_id(&state.pool, role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))?;

        if target.is_system && !caller.is_super_admin() {
            return Err(AppError::forbidden(
                "Assigning a system role requires super administrator",
            ));
        }
    }

    let updated = user::assign_role(&state.pool, user_id, payload.role_id).await?;
    state.permission_cache.invalidate();

    Ok(Json(updated))
}
