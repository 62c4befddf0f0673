//! The key/value storage boundary.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// Persistent string key/value store.
///
/// Writes may fail with [`StoreError::QuotaExceeded`] when a size ceiling
/// is configured; a failed `set` leaves the previous value in place.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Bytes currently stored (keys plus values).
    async fn usage(&self) -> Result<u64, StoreError>;
}

/// Bytes an entry occupies for quota accounting.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}
