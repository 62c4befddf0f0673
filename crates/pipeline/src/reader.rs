//! Turning raw file handles into content.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use futures::future::join_all;
use hoard_core::asset::ReadFile;
use hoard_core::category::Category;
use hoard_core::classify::infer_image_mime;
use hoard_core::image::encode_data_url;

use crate::error::ImportError;

/// A file the user handed over, not yet read.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    /// May be empty when the source did not report one.
    pub mime_type: String,
    pub size: u64,
    /// Milliseconds since the epoch.
    pub last_modified: i64,
    pub path: PathBuf,
}

impl FileHandle {
    /// Describe a file on disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| ImportError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        Ok(Self {
            mime_type: guess_mime(&name).to_string(),
            name,
            size: metadata.len(),
            last_modified,
            path: path.to_path_buf(),
        })
    }
}

/// MIME type from a file name; empty when unknown.
pub fn guess_mime(name: &str) -> &'static str {
    if let Some(mime) = infer_image_mime(name) {
        return mime;
    }
    let lower = name.to_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("jsx") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",
        _ => "",
    }
}

/// Async capability that reads file content.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_bytes(&self, handle: &FileHandle) -> Result<Vec<u8>, ImportError>;

    /// Content as text. Invalid UTF-8 sequences are replaced.
    async fn read_text(&self, handle: &FileHandle) -> Result<String, ImportError> {
        let bytes = self.read_bytes(handle).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Content as a base64 `data:` URL.
    async fn read_data_url(&self, handle: &FileHandle) -> Result<String, ImportError> {
        let bytes = self.read_bytes(handle).await?;
        Ok(encode_data_url(&handle.mime_type, &bytes))
    }
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn read_bytes(&self, handle: &FileHandle) -> Result<Vec<u8>, ImportError> {
        tokio::fs::read(&handle.path).await.map_err(|e| ImportError::Read {
            name: handle.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// A file that could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadFailure {
    pub name: String,
    pub reason: String,
}

/// Result of [`read_batch`]: readable files in input order plus failures.
#[derive(Debug, Clone, Default)]
pub struct ReadBatch {
    pub files: Vec<ReadFile>,
    pub failed: Vec<ReadFailure>,
}

/// Read every handle concurrently.
///
/// Unreadable files are excluded from `files` and listed in `failed`; one
/// failure never aborts the batch.
pub async fn read_batch(
    reader: &dyn FileReader,
    handles: &[FileHandle],
    category: Option<Category>,
) -> ReadBatch {
    let results = join_all(handles.iter().map(|h| reader.read_text(h))).await;

    let mut batch = ReadBatch::default();
    for (handle, result) in handles.iter().zip(results) {
        match result {
            Ok(content) => batch.files.push(ReadFile {
                name: handle.name.clone(),
                size: handle.size,
                mime_type: handle.mime_type.clone(),
                content,
                selected_category: category,
            }),
            Err(e) => {
                tracing::warn!(file = %handle.name, error = %e, "Skipping unreadable file");
                batch.failed.push(ReadFailure {
                    name: handle.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    batch
}
