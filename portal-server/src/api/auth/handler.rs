//! Authentication Handlers
//!
//! Handles login and current-user lookup

use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::core::ServerState;
use crate::db::repository::{role, user};
use crate::security_log;
use crate::utils::validation::{MAX_EMAIL_LEN, MAX_PASSWORD_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{User, UserInfo};
use sqlx::SqlitePool;

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with JWT token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Login handler
///
/// Authenticates user credentials and returns a JWT token. Error
/// messages are unified to prevent email enumeration.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_required_text(&req.email, "email", MAX_EMAIL_LEN)?;
    validate_required_text(&req.password, "password", MAX_PASSWORD_LEN)?;

    let found = user::find_by_email(&state.pool, &req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match found {
        Some(u) => {
            if !u.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            let password_valid = user::verify_password(&u.password_hash, &req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

            if !password_valid {
                security_log!("WARN", "login_failed", email = req.email.clone());
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            security_log!("WARN", "login_failed", email = req.email.clone());
            return Err(AppError::invalid_credentials());
        }
    };

    let identity = state.permission_cache.resolve(&state.pool, user.id).await?;

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        "User logged in successfully"
    );

    let user_info = build_user_info(&state.pool, &user, &identity).await?;
    Ok(Json(LoginResponse {
        token,
        user: user_info,
    }))
}

/// Get current user info (fresh identity for the presented token)
pub async fn me(
    State(state): State<ServerState>,
    Extension(caller): Extension<Arc<CallerIdentity>>,
) -> AppResult<Json<UserInfo>> {
    let user = user::find_by_id(&state.pool, caller.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let user_info = build_user_info(&state.pool, &user, &caller).await?;
    Ok(Json(user_info))
}

async fn build_user_info(
    pool: &SqlitePool,
    user: &User,
    identity: &CallerIdentity,
) -> AppResult<UserInfo> {
    let role_name = match user.role_id {
        Some(role_id) => role::find_by_id(pool, role_id).await?.map(|r| r.name),
        None => None,
    };

    Ok(UserInfo {
        id: user.id,
        uuid: user.uuid.clone(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: user.role.clone(),
        role_id: user.role_id,
        role_name,
        permissions: identity.permission_slugs(),
        is_super_admin: identity.is_super_admin(),
    })
}
