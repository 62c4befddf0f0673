use hoard_core::error::CoreError;
use hoard_db::{RepoError, StoreError};

/// Whole-operation failure of an import.
///
/// Per-file problems (unreadable content, rejected images) are collected in
/// the reports instead and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The batch was empty after filtering and reading. Informational.
    #[error("Nothing to import")]
    NothingToImport,

    #[error("A duplicate resolution is already in progress")]
    ResolutionInProgress,

    #[error("No duplicate resolution is in progress")]
    NoActiveSession,

    #[error("Failed to read '{name}': {reason}")]
    Read { name: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<RepoError> for ImportError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Core(e) => Self::Core(e),
            RepoError::Store(e) => Self::Store(e),
        }
    }
}

impl ImportError {
    /// Message for the user, with a hint when storage is full.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(e) if e.is_quota() => {
                "Storage is full. Delete or export some files, then try again.".to_string()
            }
            Self::Store(e) => format!("Saving failed: {e}"),
            other => other.to_string(),
        }
    }
}
