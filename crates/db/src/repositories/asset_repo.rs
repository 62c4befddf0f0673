//! Repository for the text-asset world (`assets-by-category`).

use std::sync::Arc;

use chrono::Utc;
use hoard_core::asset::{Asset, ReadFile};
use hoard_core::backup;
use hoard_core::category::Category;
use hoard_core::error::CoreError;
use hoard_core::library::{CategorizedAssets, LibraryStats};
use hoard_core::types::AssetId;

use crate::error::{RepoError, StoreError};
use crate::keys;
use crate::store::ContentStore;

/// Serialized payloads above this size risk the page-storage limit.
pub const SOFT_SIZE_LIMIT_BYTES: usize = 4_500_000;

/// Owns the category-to-assets mapping and persists it.
pub struct AssetRepo {
    store: Arc<dyn ContentStore>,
    library: CategorizedAssets,
    diagnostic: Option<String>,
}

impl AssetRepo {
    /// Load from the store. Missing data yields an empty library; malformed
    /// data also yields an empty library and a diagnostic.
    pub async fn load(store: Arc<dyn ContentStore>) -> Result<Self, StoreError> {
        let mut repo = Self {
            store,
            library: CategorizedAssets::default(),
            diagnostic: None,
        };
        repo.reload().await?;
        Ok(repo)
    }

    /// Replace the in-memory library with what the store holds.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let raw = self.store.get(keys::ASSETS_BY_CATEGORY).await?;
        let (library, diagnostic) = match raw {
            None => (CategorizedAssets::default(), None),
            Some(json) => match parse_library(&json) {
                Ok(library) => (library, None),
                Err(reason) => {
                    tracing::warn!(%reason, "Stored assets are malformed, starting empty");
                    (CategorizedAssets::default(), Some(reason))
                }
            },
        };
        self.library = library;
        self.diagnostic = diagnostic;
        tracing::debug!(total = self.library.total_count(), "Assets loaded");
        Ok(())
    }

    /// Diagnostic from the last load, if the stored data was unusable.
    pub fn take_diagnostic(&mut self) -> Option<String> {
        self.diagnostic.take()
    }

    pub fn library(&self) -> &CategorizedAssets {
        &self.library
    }

    pub fn find_file_by_name_exact(&self, name: &str) -> Option<&Asset> {
        self.library.find_by_name_exact(name)
    }

    pub fn find_by_id(&self, id: AssetId) -> Option<&Asset> {
        self.library.find_by_id(id)
    }

    pub fn stats(&self) -> LibraryStats {
        self.library.stats()
    }

    /// Persist the library, then read it back to check the write landed.
    pub async fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.library)?;
        if json.len() > SOFT_SIZE_LIMIT_BYTES {
            tracing::warn!(
                bytes = json.len(),
                limit = SOFT_SIZE_LIMIT_BYTES,
                "Asset data is close to the storage limit"
            );
        }

        if let Err(e) = self.store.set(keys::ASSETS_BY_CATEGORY, &json).await {
            tracing::error!(error = %e, "Failed to persist assets");
            return Err(e);
        }

        // The write already landed; a failed read-back is only reported.
        match self.store.get(keys::ASSETS_BY_CATEGORY).await {
            Ok(Some(stored)) if stored.len() == json.len() => {}
            Ok(Some(stored)) => tracing::warn!(
                expected = json.len(),
                actual = stored.len(),
                "Stored asset data length differs from what was written"
            ),
            Ok(None) => tracing::warn!("Asset data missing right after write"),
            Err(e) => tracing::warn!(error = %e, "Could not read back asset data"),
        }
        Ok(())
    }

    /// Append a batch and persist it as one unit.
    ///
    /// If persisting fails the appended assets are removed again and the
    /// library is exactly as it was before the call.
    pub async fn append_batch(&mut self, assets: Vec<Asset>) -> Result<(), StoreError> {
        let checkpoint = self.library.checkpoint();
        let count = assets.len();
        for asset in assets {
            self.library.push(asset);
        }
        if let Err(e) = self.save().await {
            self.library.truncate_to(checkpoint);
            tracing::warn!(count, "Rolled back unsaved batch");
            return Err(e);
        }
        Ok(())
    }

    /// Overwrite an asset's content with an imported file and persist.
    pub async fn replace_content(&mut self, id: AssetId, imported: &ReadFile) -> Result<Asset, RepoError> {
        self.mutate(|library| library.replace_content(id, imported, Utc::now()).cloned())
            .await
    }

    pub async fn toggle_favorite(&mut self, id: AssetId) -> Result<bool, RepoError> {
        self.mutate(|library| library.toggle_favorite(id)).await
    }

    pub async fn rename(&mut self, id: AssetId, new_name: &str) -> Result<(), RepoError> {
        self.mutate(|library| library.rename(id, new_name)).await
    }

    pub async fn move_to(&mut self, id: AssetId, category: Category) -> Result<(), RepoError> {
        self.mutate(|library| library.move_to(id, category)).await
    }

    pub async fn delete(&mut self, id: AssetId) -> Result<Asset, RepoError> {
        self.mutate(|library| library.remove(id)).await
    }

    pub async fn clear(&mut self) -> Result<(), RepoError> {
        self.mutate(|library| {
            library.clear();
            Ok(())
        })
        .await
    }

    /// Pretty-printed backup of all text assets.
    pub fn export_backup(&self) -> Result<String, CoreError> {
        backup::export_assets(&self.library)
    }

    /// Replace the whole library with a validated backup.
    pub async fn import_backup(&mut self, json: &str) -> Result<usize, RepoError> {
        let imported = backup::parse_backup(json)?;
        let total = imported.total_count();
        self.mutate(move |library| {
            *library = imported;
            Ok(())
        })
        .await?;
        tracing::info!(total, "Backup imported");
        Ok(total)
    }

    /// Apply `f`, persist, and restore the previous library on failure.
    async fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut CategorizedAssets) -> Result<T, CoreError>,
    ) -> Result<T, RepoError> {
        let snapshot = self.library.clone();
        let value = f(&mut self.library)?;
        if let Err(e) = self.save().await {
            self.library = snapshot;
            return Err(e.into());
        }
        Ok(value)
    }
}

fn parse_library(json: &str) -> Result<CategorizedAssets, String> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;
    if !backup::is_valid_data_structure(&value) {
        return Err("missing one or more category arrays".into());
    }
    serde_json::from_value(value).map_err(|e| format!("malformed asset record: {e}"))
}
