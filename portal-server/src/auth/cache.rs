//! Permission Cache
//!
//! Process-wide mirror of resolved caller identities, so protected
//! routes do not hit the store on every request. The cache owns an
//! immutable snapshot behind an atomically swapped `Arc`: invalidation
//! replaces the whole snapshot rather than mutating entries in place,
//! so concurrent readers see either the prior consistent snapshot or
//! trigger a fresh load — never a torn state.
//!
//! Invalidation is wholesale on any role/permission mutation. Coarse,
//! but role writes are admin-only and infrequent; the cost is a short
//! burst of redundant lookups after a write.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::SqlitePool;

use crate::auth::CallerIdentity;
use crate::db::repository::{RepoResult, role, user};

type Snapshot = HashMap<i64, Arc<CallerIdentity>>;

/// In-memory cache of user id → resolved caller identity
#[derive(Debug, Default)]
pub struct PermissionCache {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Resolve a caller identity, from the snapshot when possible,
    /// loading from the store (and publishing) on a miss.
    pub async fn resolve(
        &self,
        pool: &SqlitePool,
        user_id: i64,
    ) -> RepoResult<Arc<CallerIdentity>> {
        if let Some(hit) = self.snapshot.read().get(&user_id) {
            return Ok(hit.clone());
        }

        let identity = Arc::new(load_identity(pool, user_id).await?);

        // Publish by swapping in a rebuilt snapshot; a concurrent
        // invalidate() between load and publish wins the write lock
        // either before us (we re-add a fresh identity) or after us
        // (our entry is dropped with the rest).
        let mut guard = self.snapshot.write();
        let mut next: Snapshot = (**guard).clone();
        next.insert(user_id, identity.clone());
        *guard = Arc::new(next);

        Ok(identity)
    }

    /// Drop every cached identity. Called after any successful role or
    /// assignment mutation.
    pub fn invalidate(&self) {
        *self.snapshot.write() = Arc::new(HashMap::new());
        tracing::debug!("Permission cache invalidated");
    }

    /// Number of cached identities (test observability)
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a user's identity from the store: user row, then its role's
/// permission set. A missing or inactive user resolves to
/// `Unprivileged` — authentication happened upstream, authorization
/// fails closed here.
async fn load_identity(pool: &SqlitePool, user_id: i64) -> RepoResult<CallerIdentity> {
    let Some(user) = user::find_by_id(pool, user_id).await? else {
        return Ok(CallerIdentity::Unprivileged { user_id });
    };

    let (can_create_roles, permissions) = match user.role_id {
        Some(role_id) => match role::find_by_id(pool, role_id).await? {
            Some(role) => {
                let slugs = role::permission_slugs(pool, role_id).await?;
                (role.can_create_roles, slugs.into_iter().collect())
            }
            // Dangling pointer (role removed out-of-band): fail closed
            None => return Ok(CallerIdentity::Unprivileged { user_id }),
        },
        None => (false, Default::default()),
    };

    Ok(CallerIdentity::classify(&user, can_create_roles, permissions))
}
