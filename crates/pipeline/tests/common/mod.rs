#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use hoard_core::asset::{Asset, ReadFile};
use hoard_core::category::Category;
use hoard_db::MemoryStore;
use hoard_events::{Notice, NotificationSink};
use hoard_pipeline::image_pipeline::{CompressedImage, FixedDecision, ImageCodec, QuotaDecision};
use hoard_pipeline::reader::{FileHandle, FileReader};
use hoard_pipeline::{ImportConfig, ImportError, ImportOrchestrator, Repositories};

/// Serves file content from memory. Files without content fail to read.
#[derive(Default)]
pub struct MemoryReader {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryReader {
    pub fn put(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(name.to_string(), bytes.into());
    }
}

#[async_trait]
impl FileReader for MemoryReader {
    async fn read_bytes(&self, handle: &FileHandle) -> Result<Vec<u8>, ImportError> {
        self.files
            .lock()
            .unwrap()
            .get(&handle.name)
            .cloned()
            .ok_or_else(|| ImportError::Read {
                name: handle.name.clone(),
                reason: "permission denied".into(),
            })
    }
}

/// Reports 4x4 for anything that does not start with `BAD`; "compresses"
/// by prefixing `jpeg:`.
pub struct StubCodec;

impl ImageCodec for StubCodec {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), String> {
        if bytes.starts_with(b"BAD") {
            Err("unsupported format".into())
        } else {
            Ok((4, 4))
        }
    }

    fn compress(&self, bytes: &[u8], _max_width: u32, _quality: f32) -> Result<CompressedImage, String> {
        let mut out = b"jpeg:".to_vec();
        out.extend_from_slice(bytes);
        Ok(CompressedImage {
            bytes: out,
            width: 2,
            height: 2,
        })
    }
}

/// Collects every notice.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn event_types(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.event_type.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub reader: Arc<MemoryReader>,
    pub sink: Arc<RecordingSink>,
    pub repos: Repositories,
    pub orchestrator: ImportOrchestrator,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_decision(QuotaDecision::Proceed).await
    }

    pub async fn with_decision(decision: QuotaDecision) -> Self {
        let store = Arc::new(MemoryStore::new());
        let reader = Arc::new(MemoryReader::default());
        let sink = Arc::new(RecordingSink::default());
        let repos = Repositories::load(store.clone()).await.unwrap();
        let orchestrator = ImportOrchestrator::new(
            ImportConfig::without_cooldowns(),
            reader.clone(),
            Arc::new(StubCodec),
            Arc::new(FixedDecision(decision)),
            sink.clone(),
        );
        Self {
            store,
            reader,
            sink,
            repos,
            orchestrator,
        }
    }

    /// Seed an existing asset directly into the repository.
    pub async fn seed(&mut self, id: i64, name: &str, content: &str, category: Category) {
        let file = ReadFile::new(name, "text/plain", content);
        self.repos
            .assets
            .append_batch(vec![Asset::from_read_file(&file, id, category, Utc::now())])
            .await
            .unwrap();
    }

    /// A readable text file handle.
    pub fn text(&self, name: &str, content: &str) -> FileHandle {
        self.reader.put(name, content);
        handle(name, "text/plain", content.len() as u64)
    }

    /// A readable image file handle.
    pub fn image(&self, name: &str, bytes: &[u8]) -> FileHandle {
        self.reader.put(name, bytes);
        handle(name, "image/png", bytes.len() as u64)
    }

    pub fn assets_named(&self, name: &str) -> Vec<&Asset> {
        self.repos
            .assets
            .library()
            .iter()
            .filter(|a| a.name == name)
            .collect()
    }
}

/// A handle with no content behind it.
pub fn handle(name: &str, mime_type: &str, size: u64) -> FileHandle {
    FileHandle {
        name: name.into(),
        mime_type: mime_type.into(),
        size,
        last_modified: 1_700_000_000_000,
        path: name.into(),
    }
}
