use async_trait::async_trait;
use chrono::Utc;

use super::{entry_size, ContentStore};
use crate::error::StoreError;
use crate::DbPool;

/// SQLite-backed store: one row per key in `content_store`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
    quota: Option<u64>,
}

impl SqliteStore {
    /// Connect, migrate, and wrap the pool.
    pub async fn connect(database_url: &str, quota: Option<u64>) -> Result<Self, StoreError> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        tracing::debug!(database_url, ?quota, "Content store ready");
        Ok(Self { pool, quota })
    }

    /// Wrap an already-migrated pool.
    pub fn from_pool(pool: DbPool, quota: Option<u64>) -> Self {
        Self { pool, quota }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn usage_excluding(&self, key: &str) -> Result<u64, StoreError> {
        let (bytes,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) \
             FROM content_store WHERE key <> ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;
        Ok(bytes.max(0) as u64)
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM content_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let required = self.usage_excluding(key).await? + entry_size(key, value);
            if required > quota {
                return Err(StoreError::QuotaExceeded { required, quota });
            }
        }

        sqlx::query(
            "INSERT INTO content_store (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM content_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn usage(&self) -> Result<u64, StoreError> {
        // No real key is empty.
        self.usage_excluding("").await
    }
}
