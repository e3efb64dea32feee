//! User Repository

use shared::models::user::{ROLE_ADMIN, ROLE_USER};
use shared::models::{AdminUser, User};
use shared::util::now_millis;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{RepoError, RepoResult, retrying};

const COLUMNS: &str =
    "id, uuid, email, display_name, password_hash, role, role_id, is_active, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    retrying(|| async {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM user WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    })
    .await
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    retrying(|| async {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM user WHERE email = ?"))
                .bind(email)
                .fetch_optional(pool)
                .await?;
        Ok(user)
    })
    .await
}

/// Users holding any admin role: a specific role assignment or the
/// legacy coarse admin flag
pub async fn list_admins(pool: &SqlitePool) -> RepoResult<Vec<AdminUser>> {
    retrying(|| async {
        let users = sqlx::query_as::<_, AdminUser>(
            "SELECT u.id, u.uuid, u.email, u.display_name, u.role, u.role_id, r.name AS role_name \
             FROM user u LEFT JOIN role r ON r.id = u.role_id \
             WHERE u.role_id IS NOT NULL OR u.role = 'admin' \
             ORDER BY u.email",
        )
        .fetch_all(pool)
        .await?;
        Ok(users)
    })
    .await
}

/// Assign a role to a user, or clear it with `role_id = None`.
///
/// Assigning promotes the coarse role field to `admin`; clearing
/// demotes it back to `user`. System-role gating is caller-aware and
/// lives at the handler.
pub async fn assign_role(
    pool: &SqlitePool,
    user_id: i64,
    role_id: Option<i64>,
) -> RepoResult<User> {
    retrying(|| async {
        let mut tx = pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM user WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepoError::NotFound(format!("User {user_id} not found")));
        }

        if let Some(role_id) = role_id {
            let role_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM role WHERE id = ?")
                .bind(role_id)
                .fetch_optional(&mut *tx)
                .await?;
            if role_exists.is_none() {
                return Err(RepoError::NotFound(format!("Role {role_id} not found")));
            }
        }

        let coarse_role = if role_id.is_some() {
            ROLE_ADMIN
        } else {
            ROLE_USER
        };
        sqlx::query("UPDATE user SET role_id = ?, role = ? WHERE id = ?")
            .bind(role_id)
            .bind(coarse_role)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    })
    .await?;

    find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {user_id} not found")))
}

/// Create a user (bootstrap and admin tooling)
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    display_name: &str,
    password_hash: &str,
    role: &str,
    role_id: Option<i64>,
) -> RepoResult<User> {
    let uuid = Uuid::new_v4().to_string();
    let id = retrying(|| async {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO user (uuid, email, display_name, password_hash, role, role_id, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 1, ?) RETURNING id",
        )
        .bind(&uuid)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(role)
        .bind(role_id)
        .bind(now_millis())
        .fetch_one(pool)
        .await?;
        Ok(id)
    })
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Ensure a super-admin exists (legacy bootstrap path: coarse admin
/// role, no role assignment). Returns the generated password when a
/// fresh account was created without `ADMIN_PASSWORD` set, so startup
/// can log it once.
pub async fn ensure_bootstrap_admin(
    pool: &SqlitePool,
    admin_password: Option<&str>,
) -> RepoResult<Option<String>> {
    let existing: Option<i64> = retrying(|| async {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM user WHERE role = 'admin' LIMIT 1")
            .fetch_optional(pool)
            .await?;
        Ok(id)
    })
    .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let (password, generated) = match admin_password {
        Some(p) => (p.to_string(), None),
        None => {
            let p = generate_password();
            (p.clone(), Some(p))
        }
    };

    let hash = hash_password(&password)
        .map_err(|e| RepoError::Database(format!("Failed to hash bootstrap password: {e}")))?;

    create(pool, "admin@harbor.local", "Administrator", &hash, ROLE_ADMIN, None).await?;
    tracing::info!("Bootstrap super-admin created (admin@harbor.local)");

    Ok(generated)
}

/// Hash a password using argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(
    hash: &str,
    password: &str,
) -> Result<bool, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random printable password for the bootstrap account
fn generate_password() -> String {
    use ring::rand::{SecureRandom, SystemRandom};

    let allowed =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let rng = SystemRandom::new();
    let mut out = String::with_capacity(24);
    for _ in 0..24 {
        let mut byte = [0u8; 1];
        if rng.fill(&mut byte).is_err() {
            out.push('x');
            continue;
        }
        let idx = (byte[0] as usize) % allowed.len();
        out.push(allowed.as_bytes()[idx] as char);
    }
    out
}
