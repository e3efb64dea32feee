//! Repository Module
//!
//! CRUD operations as free functions over `&SqlitePool`, with
//! parameterized queries throughout. Transient store failures (pool
//! timeout, I/O, SQLITE_BUSY/LOCKED) are retried with linear backoff;
//! schema and constraint errors fail fast.

// Auth
pub mod permission;
pub mod role;
pub mod user;

// System
pub mod setting;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Role still held by this many users
    #[error("In use by {0} user(s)")]
    InUse(i64),

    /// Protected seed data (system roles)
    #[error("{0}")]
    Protected(String),

    /// Transient store failure — retried before surfacing
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                RepoError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db) => {
                let msg = db.message();
                if msg.contains("locked") || msg.contains("busy") {
                    RepoError::Unavailable(err.to_string())
                } else {
                    RepoError::Database(err.to_string())
                }
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Retry attempts for transient store failures
const MAX_RETRIES: u32 = 3;
/// Linear backoff step between attempts
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Run a repository operation, retrying transient failures with linear
/// backoff. Transactions roll back when their future is dropped, so a
/// retried attempt always starts clean.
pub(crate) async fn retrying<T, Fut>(mut op: impl FnMut() -> Fut) -> RepoResult<T>
where
    Fut: Future<Output = RepoResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(RepoError::Unavailable(msg)) if attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    error = %msg,
                    "Transient database error, retrying"
                );
                tokio::time::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * attempt as u64))
                    .await;
            }
            other => return other,
        }
    }
}
