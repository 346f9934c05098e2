//! # Credential Store
//!
//! SQLite-backed user records and password reset tokens. The pool is opened
//! once in `main` and shared through [`UserStore`], which is cheap to clone.

pub mod models;
pub mod reset_tokens;
pub mod users;


use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

pub use models::{PublicUser, User, UserSelector};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shared handle to the credential store
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Fixed-width UTC timestamp (`2024-01-01T00:00:00Z`). The fixed width keeps
/// lexicographic comparison in SQL equal to chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// In-memory store with the full schema, for tests.
#[cfg(test)]
pub async fn test_store() -> UserStore {
    use sqlx::sqlite::SqlitePoolOptions;

    // One connection that never recycles: every connection to
    // `sqlite::memory:` is a separate database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    crate::common::migrations::create_schema(&pool)
        .await
        .unwrap();

    UserStore::new(pool)
}
