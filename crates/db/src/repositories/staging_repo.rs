//! Repository for the drag-drop staging area (`pending-import-staging`).

use std::sync::Arc;

use chrono::Utc;
use hoard_core::category::Category;
use hoard_core::staging::{PendingStaging, StagedFile, StagingStats};

use crate::error::{RepoError, StoreError};
use crate::keys;
use crate::store::ContentStore;

pub struct StagingRepo {
    store: Arc<dyn ContentStore>,
    staging: PendingStaging,
}

impl StagingRepo {
    /// Restore staged files left over from a previous session.
    pub async fn load(store: Arc<dyn ContentStore>) -> Result<Self, StoreError> {
        let staging = match store.get(keys::PENDING_IMPORT_STAGING).await? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Staging data is malformed, discarding it");
                PendingStaging::default()
            }),
            None => PendingStaging::default(),
        };
        if !staging.is_empty() {
            tracing::info!(count = staging.len(), "Restored staged files");
        }
        Ok(Self { store, staging })
    }

    pub fn staging(&self) -> &PendingStaging {
        &self.staging
    }

    pub fn stats(&self) -> StagingStats {
        self.staging.stats()
    }

    pub fn has_pending(&self) -> bool {
        !self.staging.is_empty()
    }

    async fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.staging)?;
        self.store.set(keys::PENDING_IMPORT_STAGING, &json).await
    }

    /// Stage files; returns the ids of the newly staged ones (files already
    /// staged from the same source are skipped).
    pub async fn add_all(&mut self, files: Vec<StagedFile>) -> Result<Vec<u64>, StoreError> {
        let snapshot = self.staging.clone();
        let now = Utc::now();
        let ids: Vec<u64> = files
            .into_iter()
            .filter_map(|file| self.staging.add(file, now))
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }
        if let Err(e) = self.save().await {
            self.staging = snapshot;
            return Err(e);
        }
        Ok(ids)
    }

    pub async fn remove(&mut self, id: u64) -> Result<Option<StagedFile>, StoreError> {
        let snapshot = self.staging.clone();
        let removed = self.staging.remove(id, Utc::now());
        if removed.is_some() {
            if let Err(e) = self.save().await {
                self.staging = snapshot;
                return Err(e);
            }
        }
        Ok(removed)
    }

    pub async fn set_category(&mut self, id: u64, category: Category) -> Result<(), RepoError> {
        let snapshot = self.staging.clone();
        self.staging.set_category(id, category, Utc::now())?;
        if let Err(e) = self.save().await {
            self.staging = snapshot;
            return Err(e.into());
        }
        Ok(())
    }

    /// Drop every staged file and the persisted key.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(keys::PENDING_IMPORT_STAGING).await?;
        self.staging.clear();
        Ok(())
    }
}
