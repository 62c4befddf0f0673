//! `hoard-db` -- persistence for the organizer.
//!
//! All state is stored as JSON documents under a handful of keys in a
//! [`ContentStore`](store::ContentStore). Repositories own the in-memory
//! copy and are the only writers of their keys.

pub mod error;
pub mod keys;
pub mod repositories;
pub mod store;

pub use error::{RepoError, StoreError};
pub use store::{ContentStore, MemoryStore, SqliteStore};

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

/// Create a connection pool from a database URL.
///
/// In-memory databases live and die with their connection, so they get a
/// single one that is never recycled.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(4)
    };
    options.connect(database_url).await
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
