//! Setting Repository
//!
//! Generic key/value store; values are opaque JSON text written back
//! wholesale (no partial patch semantics).

use sqlx::SqlitePool;

use super::{RepoResult, retrying};
use shared::util::now_millis;

pub async fn get(pool: &SqlitePool, key: &str) -> RepoResult<Option<String>> {
    retrying(|| async {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM setting WHERE key = ?")
                .bind(key)
                .fetch_optional(pool)
                .await?;
        Ok(value)
    })
    .await
}

pub async fn upsert(pool: &SqlitePool, key: &str, value: &str) -> RepoResult<()> {
    retrying(|| async {
        sqlx::query(
            "INSERT INTO setting (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now_millis())
        .execute(pool)
        .await?;
        Ok(())
    })
    .await
}
