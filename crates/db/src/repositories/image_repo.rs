//! Repository for the image world (`image-collection` and
//! `image-manager-config`).

use std::sync::Arc;

use chrono::Utc;
use hoard_core::backup;
use hoard_core::error::CoreError;
use hoard_core::image::{ImageAsset, ImageCollection, ImageManagerConfig, ImageStats};
use hoard_core::types::AssetId;

use crate::error::{RepoError, StoreError};
use crate::keys;
use crate::store::ContentStore;

/// Owns the image collection and the image-manager settings.
pub struct ImageRepo {
    store: Arc<dyn ContentStore>,
    collection: ImageCollection,
    config: ImageManagerConfig,
}

impl ImageRepo {
    /// Load images and settings. Unparseable data is logged and replaced by
    /// defaults; records that cannot be displayed are dropped.
    pub async fn load(store: Arc<dyn ContentStore>) -> Result<Self, StoreError> {
        let config = match store.get(keys::IMAGE_MANAGER_CONFIG).await? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Image manager config is malformed, using defaults");
                ImageManagerConfig::default()
            }),
            None => ImageManagerConfig::default(),
        };

        let images: Vec<ImageAsset> = match store.get(keys::IMAGE_COLLECTION).await? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Image collection is malformed, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let (collection, dropped) = ImageCollection::from_loaded(images);
        if dropped > 0 {
            tracing::warn!(dropped, "Dropped image records without image data");
        }
        tracing::debug!(total = collection.len(), "Images loaded");

        Ok(Self {
            store,
            collection,
            config,
        })
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn config(&self) -> &ImageManagerConfig {
        &self.config
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.collection.images
    }

    pub fn storage_usage(&self) -> u64 {
        self.collection.storage_usage()
    }

    pub fn stats(&self) -> ImageStats {
        self.collection.stats()
    }

    /// Reserve the next local image id.
    pub fn next_id(&mut self) -> AssetId {
        self.collection.next_id()
    }

    /// Persist the collection. Records carrying `compressed_data` are
    /// written without their `data_url`, which is rebuilt on load.
    pub async fn save(&self) -> Result<(), StoreError> {
        let persisted: Vec<ImageAsset> = self
            .collection
            .images
            .iter()
            .map(|image| {
                let mut image = image.clone();
                if image.compressed_data.is_some() {
                    image.data_url.clear();
                }
                image
            })
            .collect();
        let json = serde_json::to_string(&persisted)?;
        self.store
            .set(keys::IMAGE_COLLECTION, &json)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to persist images"))
    }

    pub async fn save_config(&mut self) -> Result<(), StoreError> {
        self.config.last_updated = Some(Utc::now());
        let json = serde_json::to_string(&self.config)?;
        self.store.set(keys::IMAGE_MANAGER_CONFIG, &json).await
    }

    /// Replace the settings and persist them.
    pub async fn update_config(&mut self, config: ImageManagerConfig) -> Result<(), StoreError> {
        self.config = config;
        self.save_config().await
    }

    /// Raise the storage ceiling after the user agreed to it.
    pub async fn set_max_storage_size(&mut self, bytes: u64) -> Result<(), StoreError> {
        let previous = self.config.max_storage_size;
        self.config.max_storage_size = bytes;
        if let Err(e) = self.save_config().await {
            self.config.max_storage_size = previous;
            return Err(e);
        }
        tracing::info!(previous, new = bytes, "Image storage ceiling raised");
        Ok(())
    }

    /// Append one image and persist; the image is removed again if the
    /// write fails.
    pub async fn add(&mut self, image: ImageAsset) -> Result<(), StoreError> {
        self.collection.push(image);
        if let Err(e) = self.save().await {
            self.collection.images.pop();
            return Err(e);
        }
        Ok(())
    }

    pub async fn toggle_favorite(&mut self, id: AssetId) -> Result<bool, RepoError> {
        self.mutate(|c| c.toggle_favorite(id)).await
    }

    /// Returns `false` when the name did not change (nothing persisted).
    pub async fn rename(&mut self, id: AssetId, new_name: &str) -> Result<bool, RepoError> {
        self.mutate(|c| c.rename(id, new_name)).await
    }

    pub async fn delete(&mut self, id: AssetId) -> Result<ImageAsset, RepoError> {
        self.mutate(|c| c.remove(id)).await
    }

    pub async fn clear(&mut self) -> Result<(), RepoError> {
        self.mutate(|c| {
            c.clear();
            Ok(())
        })
        .await
    }

    /// Image metadata backup without payloads.
    pub fn export(&self) -> Result<String, CoreError> {
        backup::export_images(&self.collection.images)
    }

    async fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut ImageCollection) -> Result<T, CoreError>,
    ) -> Result<T, RepoError> {
        let snapshot = self.collection.clone();
        let value = f(&mut self.collection)?;
        if let Err(e) = self.save().await {
            self.collection = snapshot;
            return Err(e.into());
        }
        Ok(value)
    }
}
