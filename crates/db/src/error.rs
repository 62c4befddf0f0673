use hoard_core::error::CoreError;

/// Failure talking to a [`ContentStore`](crate::store::ContentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage quota exceeded: {required} bytes required, quota is {quota} bytes")]
    QuotaExceeded { required: u64, quota: u64 },

    #[error("Write rejected: {0}")]
    WriteRejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Whether the failure is a storage-full condition the user can fix by
    /// cleaning up or exporting.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Failure of a repository operation: either the domain rejected it or
/// persisting the result failed (and the change was rolled back).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
