//! Backup export/import formats.
//!
//! The text-asset backup is the bare `assets-by-category` object, no
//! envelope. The image backup is an array of image metadata without the
//! `dataUrl` payload.

use serde_json::Value;

use crate::category::Category;
use crate::error::CoreError;
use crate::image::ImageAsset;
use crate::library::CategorizedAssets;
use crate::types::Timestamp;

/// Whether `value` is an object holding an array for every category key.
pub fn is_valid_data_structure(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    Category::ALL
        .iter()
        .all(|c| object.get(c.as_str()).is_some_and(Value::is_array))
}

/// Pretty-printed text-asset backup.
pub fn export_assets(library: &CategorizedAssets) -> Result<String, CoreError> {
    serde_json::to_string_pretty(library)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize backup: {e}")))
}

/// Parse and validate a text-asset backup.
pub fn parse_backup(json: &str) -> Result<CategorizedAssets, CoreError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::Validation(format!("Backup is not valid JSON: {e}")))?;
    if !is_valid_data_structure(&value) {
        return Err(CoreError::Validation(
            "Backup must contain arrays for items, skills, characters, talents and others".into(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("Backup contains malformed assets: {e}")))
}

/// Pretty-printed image metadata backup, payloads stripped.
pub fn export_images(images: &[ImageAsset]) -> Result<String, CoreError> {
    let stripped: Vec<Value> = images
        .iter()
        .map(|image| {
            let mut value = serde_json::to_value(image)?;
            if let Some(object) = value.as_object_mut() {
                object.remove("dataUrl");
            }
            Ok(value)
        })
        .collect::<Result<_, serde_json::Error>>()
        .map_err(|e| CoreError::Internal(format!("Failed to serialize images: {e}")))?;

    serde_json::to_string_pretty(&stripped)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize images: {e}")))
}

pub fn backup_file_name(now: Timestamp) -> String {
    format!("file-manager-backup-{}.json", now.format("%Y-%m-%d"))
}

pub fn image_backup_file_name(now: Timestamp) -> String {
    format!("image-collection-{}.json", now.format("%Y-%m-%d"))
}
