//! Pending drag-drop selections awaiting "confirm import".
//!
//! Persisted under `pending-import-staging` as
//! `{draggedFiles, fileIdCounter, lastUpdate}` so a reload does not lose a
//! multi-file selection.

use serde::{Deserialize, Serialize};

use crate::asset::ReadFile;
use crate::category::Category;
use crate::error::CoreError;
use crate::types::Timestamp;

/// A staged, not-yet-committed non-image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    /// Locally-scoped id, unique within one staging area.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// `None` when the content could not be read.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub selected_category: Category,
    /// Source modification time in milliseconds since the epoch.
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default)]
    pub read_error: bool,
}

impl StagedFile {
    pub fn read(name: impl Into<String>, mime_type: impl Into<String>, content: String, last_modified: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            size: content.len() as u64,
            mime_type: mime_type.into(),
            content: Some(content),
            selected_category: Category::default(),
            last_modified,
            read_error: false,
        }
    }

    /// A file whose content could not be read. It stays in the list so the
    /// user sees it, and is counted as failed on confirm.
    pub fn unreadable(name: impl Into<String>, mime_type: impl Into<String>, size: u64, last_modified: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content: None,
            selected_category: Category::default(),
            last_modified,
            read_error: true,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.selected_category = category;
        self
    }

    fn same_source(&self, other: &StagedFile) -> bool {
        self.name == other.name && self.size == other.size && self.last_modified == other.last_modified
    }
}

/// Count and total size of staged files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingStats {
    pub count: usize,
    pub total_size: u64,
}

/// Staged files converted for duplicate detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedBatch {
    pub files: Vec<ReadFile>,
    /// Names of staged files whose content could not be read.
    pub failed: Vec<String>,
}

/// The staging area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStaging {
    #[serde(default)]
    pub dragged_files: Vec<StagedFile>,
    #[serde(default)]
    pub file_id_counter: u64,
    pub last_update: Option<Timestamp>,
}

impl PendingStaging {
    /// Stage a file. Returns its new id, or `None` when a file with the
    /// same name, size and modification time is already staged.
    pub fn add(&mut self, mut file: StagedFile, now: Timestamp) -> Option<u64> {
        if self.dragged_files.iter().any(|f| f.same_source(&file)) {
            return None;
        }
        self.file_id_counter += 1;
        file.id = self.file_id_counter;
        self.dragged_files.push(file);
        self.last_update = Some(now);
        Some(self.file_id_counter)
    }

    pub fn remove(&mut self, id: u64, now: Timestamp) -> Option<StagedFile> {
        let index = self.dragged_files.iter().position(|f| f.id == id)?;
        self.last_update = Some(now);
        Some(self.dragged_files.remove(index))
    }

    pub fn set_category(&mut self, id: u64, category: Category, now: Timestamp) -> Result<(), CoreError> {
        let file = self
            .dragged_files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(CoreError::NotFound {
                entity: "staged file",
                id: id as i64,
            })?;
        file.selected_category = category;
        self.last_update = Some(now);
        Ok(())
    }

    pub fn stats(&self) -> StagingStats {
        StagingStats {
            count: self.dragged_files.len(),
            total_size: self.dragged_files.iter().map(|f| f.size).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dragged_files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dragged_files.len()
    }

    /// Split staged files into readable [`ReadFile`]s carrying their
    /// selected category, and the names of unreadable ones.
    pub fn to_batch(&self) -> StagedBatch {
        let mut batch = StagedBatch::default();
        for staged in &self.dragged_files {
            match (&staged.content, staged.read_error) {
                (Some(content), false) => batch.files.push(ReadFile {
                    name: staged.name.clone(),
                    size: staged.size,
                    mime_type: staged.mime_type.clone(),
                    content: content.clone(),
                    selected_category: Some(staged.selected_category),
                }),
                _ => batch.failed.push(staged.name.clone()),
            }
        }
        batch
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
