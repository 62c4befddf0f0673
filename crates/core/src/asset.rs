//! Text-asset records and freshly-read import candidates.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::classify::is_code_file;
use crate::content::count_code_segments;
use crate::types::{AssetId, Timestamp};

/// A stored non-image file.
///
/// `name` is not unique: several assets may share a name after an
/// "add as new" resolution. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// MIME type as reported at import time (may be empty).
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content: String,
    pub category: Category,
    #[serde(default)]
    pub favorite: bool,
    /// Number of code segments; zero for files without a code extension.
    #[serde(default)]
    pub code_segments: u32,
    pub upload_time: Timestamp,
}

impl Asset {
    /// Build a fresh, unfavorited asset from a read file.
    pub fn from_read_file(
        file: &ReadFile,
        id: AssetId,
        category: Category,
        upload_time: Timestamp,
    ) -> Self {
        Self {
            id,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            content: file.content.clone(),
            category,
            favorite: false,
            code_segments: code_segments_for(&file.name, &file.content),
            upload_time,
        }
    }
}

/// Code segments are only counted for recognised code file extensions.
pub fn code_segments_for(name: &str, content: &str) -> u32 {
    if is_code_file(name) {
        count_code_segments(content)
    } else {
        0
    }
}

/// A file whose content has been fully read, ready for duplicate detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub content: String,
    /// Per-file target category chosen in the staging list, if any.
    #[serde(default)]
    pub selected_category: Option<Category>,
}

impl ReadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            mime_type: mime_type.into(),
            content,
            selected_category: None,
        }
    }

    /// Attach a per-file target category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.selected_category = Some(category);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn from_read_file_counts_segments_for_code() {
        let file = ReadFile::new(
            "tool.js",
            "text/javascript",
            "function heal(target) { return target.hp + 10; }",
        );
        let asset = Asset::from_read_file(&file, 7, Category::Skills, Utc::now());
        assert_eq!(asset.id, 7);
        assert_eq!(asset.category, Category::Skills);
        assert!(!asset.favorite);
        assert!(asset.code_segments >= 1);
    }

    #[test]
    fn from_read_file_skips_segments_for_plain_text() {
        let file = ReadFile::new("potion.txt", "text/plain", "heal 10");
        let asset = Asset::from_read_file(&file, 1, Category::Items, Utc::now());
        assert_eq!(asset.code_segments, 0);
        assert_eq!(asset.size, 7);
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let file = ReadFile::new("a.txt", "text/plain", "x");
        let asset = Asset::from_read_file(&file, 1, Category::Items, Utc::now());
        let json = serde_json::to_value(&asset).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("codeSegments").is_some());
        assert!(json.get("uploadTime").is_some());
        assert_eq!(json["category"], "items");
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let json = serde_json::json!({
            "id": 5,
            "name": "old.txt",
            "category": "others",
            "uploadTime": "2024-01-01T00:00:00Z"
        });
        let asset: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(asset.content, "");
        assert!(!asset.favorite);
        assert_eq!(asset.code_segments, 0);
    }
}
