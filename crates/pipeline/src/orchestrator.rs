//! The import entry points.
//!
//! Page drop, modal drop and the file picker share one contract: debounce,
//! split image-typed files from the rest, hand images to the
//! [`ImageImportPipeline`] right away, and route everything else through
//! the [`DuplicateResolutionEngine`]. Drops go through the persisted
//! staging list first and are committed on [`confirm_staged_import`];
//! the picker commits straight into one category.
//!
//! [`confirm_staged_import`]: ImportOrchestrator::confirm_staged_import

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hoard_core::category::Category;
use hoard_core::classify::is_image_file;
use hoard_core::duplicate::{DuplicateCandidate, ResolutionAction};
use hoard_core::staging::StagedFile;
use hoard_db::repositories::{AssetRepo, ImageRepo, StagingRepo};
use hoard_db::{ContentStore, StoreError};
use hoard_events::{Notice, NotificationSink};

use crate::config::ImportConfig;
use crate::engine::{BeginOutcome, CategoryResolver, CommitSummary, DuplicateResolutionEngine, Presentation, Step};
use crate::error::ImportError;
use crate::image_pipeline::{ImageCodec, ImageImportPipeline, ImageImportReport, QuotaPrompt};
use crate::reader::{read_batch, FileHandle, FileReader};

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Every repository the import workflow writes to.
pub struct Repositories {
    pub assets: AssetRepo,
    pub images: ImageRepo,
    pub staging: StagingRepo,
}

impl Repositories {
    pub async fn load(store: Arc<dyn ContentStore>) -> Result<Self, StoreError> {
        Ok(Self {
            assets: AssetRepo::load(store.clone()).await?,
            images: ImageRepo::load(store.clone()).await?,
            staging: StagingRepo::load(store).await?,
        })
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    PageDrop,
    ModalDrop,
    FilePicker,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageDrop => "page_drop",
            Self::ModalDrop => "modal_drop",
            Self::FilePicker => "file_picker",
        }
    }

    /// A modal drop also reaches the page handler, so both drop targets
    /// share one window.
    fn window(self) -> Window {
        match self {
            Self::PageDrop | Self::ModalDrop => Window::Drop,
            Self::FilePicker => Window::Picker,
        }
    }

    fn cooldown(self, config: &ImportConfig) -> Duration {
        match self.window() {
            Window::Drop => config.drop_cooldown,
            Window::Picker => config.picker_cooldown,
        }
    }
}

/// Debounce window shared by one or more entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Window {
    Drop,
    Picker,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to the non-image part of an import.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    /// No non-image files, or none readable.
    NothingToImport,
    /// Files were put in the staging list for later confirmation.
    Staged { ids: Vec<u64>, already_staged: usize },
    /// Duplicates were found; the wizard is waiting for decisions.
    AwaitingResolution { duplicates: usize, uniques: usize },
    Committed(CommitSummary),
}

/// Summary of one entry-point call. Image and text results are separate.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub images: ImageImportReport,
    pub text: TextOutcome,
    /// Names of non-image files whose content could not be read.
    pub failed_reads: Vec<String>,
}

/// Result of an entry-point call.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportResult {
    /// An entry point sharing the same window fired inside its cooldown;
    /// ignored.
    Debounced,
    Processed(ImportReport),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct ImportOrchestrator {
    config: ImportConfig,
    reader: Arc<dyn FileReader>,
    engine: DuplicateResolutionEngine,
    images: ImageImportPipeline,
    sink: Arc<dyn NotificationSink>,
    last_fired: HashMap<Window, Instant>,
    /// The open engine session came from the staging list.
    session_from_staging: bool,
}

impl ImportOrchestrator {
    pub fn new(
        config: ImportConfig,
        reader: Arc<dyn FileReader>,
        codec: Arc<dyn ImageCodec>,
        prompt: Arc<dyn QuotaPrompt>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let images = ImageImportPipeline::new(&config, codec, prompt, sink.clone());
        Self {
            engine: DuplicateResolutionEngine::new(sink.clone()),
            config,
            reader,
            images,
            sink,
            last_fired: HashMap::new(),
            session_from_staging: false,
        }
    }

    pub fn is_resolving(&self) -> bool {
        self.engine.is_resolving()
    }

    /// `true` when `entry` may fire now; records the firing.
    fn admit(&mut self, entry: EntryPoint, now: Instant) -> bool {
        let cooldown = entry.cooldown(&self.config);
        if let Some(last) = self.last_fired.get(&entry.window()) {
            if now.saturating_duration_since(*last) < cooldown {
                tracing::debug!(entry = entry.as_str(), "Import event debounced");
                return false;
            }
        }
        self.last_fired.insert(entry.window(), now);
        true
    }

    fn split(handles: Vec<FileHandle>) -> (Vec<FileHandle>, Vec<FileHandle>) {
        handles
            .into_iter()
            .partition(|h| is_image_file(&h.name, &h.mime_type))
    }

    // -- drop entry points -------------------------------------------------

    /// Page-level or modal drop: images are imported now, everything else
    /// is read and staged.
    pub async fn handle_drop(
        &mut self,
        repos: &mut Repositories,
        entry: EntryPoint,
        handles: Vec<FileHandle>,
    ) -> Result<ImportResult, ImportError> {
        if !self.admit(entry, Instant::now()) {
            return Ok(ImportResult::Debounced);
        }

        let (image_handles, other_handles) = Self::split(handles);
        tracing::info!(
            entry = entry.as_str(),
            images = image_handles.len(),
            others = other_handles.len(),
            "Files dropped"
        );

        let images = self
            .images
            .import(&mut repos.images, self.reader.as_ref(), &image_handles)
            .await;

        if other_handles.is_empty() {
            return Ok(ImportResult::Processed(ImportReport {
                images,
                text: TextOutcome::NothingToImport,
                failed_reads: Vec::new(),
            }));
        }

        let mut staged = Vec::with_capacity(other_handles.len());
        let mut failed_reads = Vec::new();
        for handle in &other_handles {
            let file = match self.reader.read_text(handle).await {
                Ok(content) => StagedFile::read(
                    handle.name.clone(),
                    handle.mime_type.clone(),
                    content,
                    handle.last_modified,
                ),
                Err(e) => {
                    tracing::warn!(file = %handle.name, error = %e, "Staging unreadable file");
                    failed_reads.push(handle.name.clone());
                    StagedFile::unreadable(
                        handle.name.clone(),
                        handle.mime_type.clone(),
                        handle.size,
                        handle.last_modified,
                    )
                }
            };
            staged.push(file);
        }

        let offered = staged.len();
        let ids = repos.staging.add_all(staged).await.inspect_err(|e| {
            self.sink
                .notify(Notice::error("staging.save_failed", format!("Could not save the file list: {e}")));
        })?;
        let already_staged = offered - ids.len();

        self.sink.notify(Notice::info(
            "staging.updated",
            format!("{} file(s) ready to import", repos.staging.stats().count),
        ));

        Ok(ImportResult::Processed(ImportReport {
            images,
            text: TextOutcome::Staged { ids, already_staged },
            failed_reads,
        }))
    }

    pub async fn set_staged_category(
        &mut self,
        repos: &mut Repositories,
        id: u64,
        category: Category,
    ) -> Result<(), ImportError> {
        repos.staging.set_category(id, category).await?;
        Ok(())
    }

    pub async fn remove_staged(&mut self, repos: &mut Repositories, id: u64) -> Result<bool, ImportError> {
        Ok(repos.staging.remove(id).await?.is_some())
    }

    /// Cancel the staged selection without importing.
    pub async fn clear_staging(&mut self, repos: &mut Repositories) -> Result<(), ImportError> {
        repos.staging.clear().await?;
        self.sink.notify(Notice::info("staging.cleared", "Pending files discarded"));
        Ok(())
    }

    /// Import the staged files, each into its own selected category.
    ///
    /// Unreadable staged files are counted as failed. The staging list is
    /// cleared once the batch is committed.
    pub async fn confirm_staged_import(&mut self, repos: &mut Repositories) -> Result<ImportReport, ImportError> {
        if self.engine.is_resolving() {
            return Err(ImportError::ResolutionInProgress);
        }

        let batch = repos.staging.staging().to_batch();
        let failed_reads = batch.failed;
        let resolver = CategoryResolver::PerFile {
            default: Category::default(),
        };

        let text = self
            .begin_text_import(repos, batch.files, resolver, true)
            .await?;

        Ok(ImportReport {
            images: ImageImportReport::default(),
            text,
            failed_reads,
        })
    }

    // -- file picker ---------------------------------------------------------

    /// Traditional file selection: every non-image file goes into
    /// `category`.
    pub async fn handle_file_picker(
        &mut self,
        repos: &mut Repositories,
        handles: Vec<FileHandle>,
        category: Category,
    ) -> Result<ImportResult, ImportError> {
        if !self.admit(EntryPoint::FilePicker, Instant::now()) {
            return Ok(ImportResult::Debounced);
        }

        let (image_handles, other_handles) = Self::split(handles);
        if !other_handles.is_empty() && self.engine.is_resolving() {
            return Err(ImportError::ResolutionInProgress);
        }

        let images = self
            .images
            .import(&mut repos.images, self.reader.as_ref(), &image_handles)
            .await;

        let read = read_batch(self.reader.as_ref(), &other_handles, None).await;
        let failed_reads: Vec<String> = read.failed.into_iter().map(|f| f.name).collect();
        if !failed_reads.is_empty() {
            self.sink.notify(Notice::warning(
                "import.read_failed",
                format!("{} file(s) could not be read", failed_reads.len()),
            ));
        }

        let text = if other_handles.is_empty() {
            TextOutcome::NothingToImport
        } else {
            self.begin_text_import(repos, read.files, CategoryResolver::Fixed(category), false)
                .await?
        };

        Ok(ImportResult::Processed(ImportReport {
            images,
            text,
            failed_reads,
        }))
    }

    async fn begin_text_import(
        &mut self,
        repos: &mut Repositories,
        files: Vec<hoard_core::asset::ReadFile>,
        resolver: CategoryResolver,
        from_staging: bool,
    ) -> Result<TextOutcome, ImportError> {
        match self.engine.begin(&mut repos.assets, files, resolver).await {
            Ok(BeginOutcome::Committed(summary)) => {
                if from_staging {
                    self.clear_staging_after_commit(repos).await;
                }
                Ok(TextOutcome::Committed(summary))
            }
            Ok(BeginOutcome::Resolving { duplicates, uniques }) => {
                self.session_from_staging = from_staging;
                Ok(TextOutcome::AwaitingResolution { duplicates, uniques })
            }
            Err(ImportError::NothingToImport) => {
                self.sink.notify(Notice::info("import.nothing", "Nothing to import"));
                Ok(TextOutcome::NothingToImport)
            }
            Err(e) => {
                // A failed direct commit keeps its session open for retry.
                self.session_from_staging = from_staging && self.engine.is_resolving();
                Err(e)
            }
        }
    }

    async fn clear_staging_after_commit(&mut self, repos: &mut Repositories) {
        if let Err(e) = repos.staging.clear().await {
            tracing::warn!(error = %e, "Imported files committed but staging list not cleared");
        }
    }

    async fn after_commit(&mut self, repos: &mut Repositories) {
        if std::mem::take(&mut self.session_from_staging) {
            self.clear_staging_after_commit(repos).await;
        }
    }

    // -- wizard --------------------------------------------------------------

    pub fn presentation(&self) -> Option<Presentation<'_>> {
        self.engine.presentation()
    }

    pub fn candidates(&self) -> &[DuplicateCandidate] {
        self.engine.candidates()
    }

    pub fn select(&mut self, index: usize) -> Result<(), ImportError> {
        self.engine.select(index)
    }

    pub async fn resolve(&mut self, repos: &mut Repositories, action: ResolutionAction) -> Result<Step, ImportError> {
        let step = self.engine.resolve(&mut repos.assets, action).await?;
        if matches!(step, Step::Committed(_)) {
            self.after_commit(repos).await;
        }
        Ok(step)
    }

    pub async fn cancel_resolution(&mut self, repos: &mut Repositories) -> Result<CommitSummary, ImportError> {
        let summary = self.engine.cancel(&mut repos.assets).await?;
        self.after_commit(repos).await;
        Ok(summary)
    }

    pub async fn retry_commit(&mut self, repos: &mut Repositories) -> Result<CommitSummary, ImportError> {
        let summary = self.engine.retry_commit(&mut repos.assets).await?;
        self.after_commit(repos).await;
        Ok(summary)
    }

    /// Give up on a session whose commit keeps failing. Staged files stay
    /// staged.
    pub fn discard_resolution(&mut self) -> Option<usize> {
        self.session_from_staging = false;
        self.engine.discard()
    }

    // -- unload ----------------------------------------------------------------

    /// Confirmation text to show before leaving, if anything is pending.
    pub fn unload_warning(&self, repos: &Repositories) -> Option<String> {
        if self.engine.is_resolving() {
            return Some("A duplicate resolution is still open. Leave anyway?".into());
        }
        let stats = repos.staging.stats();
        (stats.count > 0).then(|| {
            format!(
                "{} file(s) are waiting to be imported. Leave anyway?",
                stats.count
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::{FixedDecision, QuotaDecision, RasterCodec};
    use crate::reader::FsReader;
    use hoard_events::EventBus;

    #[test]
    fn entry_point_cooldowns() {
        let config = ImportConfig::default();
        assert_eq!(EntryPoint::PageDrop.cooldown(&config), Duration::from_millis(500));
        assert_eq!(EntryPoint::ModalDrop.cooldown(&config), Duration::from_millis(500));
        assert_eq!(EntryPoint::FilePicker.cooldown(&config), Duration::from_millis(1000));
    }

    #[test]
    fn drops_share_one_window() {
        let mut orchestrator = ImportOrchestrator::new(
            ImportConfig::default(),
            Arc::new(FsReader),
            Arc::new(RasterCodec),
            Arc::new(FixedDecision(QuotaDecision::Abort)),
            Arc::new(EventBus::default()),
        );
        let start = Instant::now();
        assert!(orchestrator.admit(EntryPoint::ModalDrop, start));
        assert!(!orchestrator.admit(EntryPoint::PageDrop, start + Duration::from_millis(10)));
        assert!(orchestrator.admit(EntryPoint::FilePicker, start + Duration::from_millis(10)));
        assert!(orchestrator.admit(EntryPoint::PageDrop, start + Duration::from_millis(600)));
    }

    #[test]
    fn split_uses_mime_or_extension() {
        let handle = |name: &str, mime: &str| FileHandle {
            name: name.into(),
            mime_type: mime.into(),
            size: 1,
            last_modified: 0,
            path: name.into(),
        };
        let (images, others) = ImportOrchestrator::split(vec![
            handle("a.png", ""),
            handle("blob", "image/gif"),
            handle("notes.txt", "text/plain"),
        ]);
        assert_eq!(images.len(), 2);
        assert_eq!(others[0].name, "notes.txt");
    }
}
