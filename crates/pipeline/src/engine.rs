//! Duplicate resolution and commit for text-asset imports.
//!
//! [`DuplicateResolutionEngine`] holds at most one [`ResolutionSession`] at
//! a time; the `Option` is the busy latch. A session runs:
//!
//! 1. partition the batch against the repository snapshot,
//! 2. let the user resolve each duplicate (replace is applied to the
//!    repository immediately, skip and add-as-new wait for commit),
//! 3. commit add-as-new results plus uniques as one persisted append,
//!    rolled back if persisting fails,
//! 4. compare the repository's new total with the expected count and
//!    reload from the store on mismatch.
//!
//! A failed commit keeps the session so the same batch can be retried.

use std::sync::Arc;

use chrono::Utc;
use hoard_core::asset::{Asset, ReadFile};
use hoard_core::category::Category;
use hoard_core::diff::{side_by_side, SideBySide};
use hoard_core::duplicate::{detect_duplicates, DuplicateCandidate, ResolutionAction};
use hoard_core::error::CoreError;
use hoard_core::ids::synthesize_ids;
use hoard_core::wizard::{Advance, WizardState};
use hoard_db::repositories::AssetRepo;
use hoard_events::{Notice, NotificationSink};
use serde::Serialize;

use crate::error::ImportError;

// ---------------------------------------------------------------------------
// Category resolution
// ---------------------------------------------------------------------------

/// Decides the target category of each accepted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryResolver {
    /// Each file carries its own category; `default` covers files without.
    PerFile { default: Category },
    /// Every file goes to one category.
    Fixed(Category),
}

impl CategoryResolver {
    pub fn resolve(&self, file: &ReadFile) -> Category {
        match self {
            Self::PerFile { default } => file.selected_category.unwrap_or(*default),
            Self::Fixed(category) => *category,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Post-commit consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Verification {
    Verified,
    /// The repository grew by `actual` instead of `expected`; it was
    /// reloaded from the store.
    Mismatch { expected: i64, actual: i64, reloaded: bool },
}

/// What one committed session did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    /// New assets appended (add-as-new plus uniques).
    pub total_imported: usize,
    pub added_as_new_count: usize,
    pub skipped_count: usize,
    pub replaced_count: usize,
    /// Candidates skipped because the wizard was cancelled.
    pub implicitly_skipped: usize,
    pub skipped_files: Vec<String>,
    pub replaced_files: Vec<String>,
    pub verification: Verification,
}

/// Result of [`DuplicateResolutionEngine::begin`].
#[derive(Debug, Clone, PartialEq)]
pub enum BeginOutcome {
    /// No duplicates; everything was committed directly.
    Committed(CommitSummary),
    /// The wizard is open.
    Resolving { duplicates: usize, uniques: usize },
}

/// Result of [`DuplicateResolutionEngine::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Another candidate is now presented.
    Next(usize),
    /// That was the last one; the session was committed.
    Committed(CommitSummary),
}

/// The presented candidate with its side-by-side diff.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation<'a> {
    pub index: usize,
    pub total: usize,
    pub remaining: usize,
    pub candidate: &'a DuplicateCandidate,
    pub diff: SideBySide,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One import batch from partition to commit.
#[derive(Debug)]
struct ResolutionSession {
    wizard: WizardState,
    uniques: Vec<ReadFile>,
    resolver: CategoryResolver,
    /// Repository total when the session began.
    baseline_total: usize,
    implicitly_skipped: usize,
}

/// Drives duplicate resolution against an [`AssetRepo`].
pub struct DuplicateResolutionEngine {
    session: Option<ResolutionSession>,
    sink: Arc<dyn NotificationSink>,
}

impl DuplicateResolutionEngine {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            session: None,
            sink,
        }
    }

    /// Whether a session is open (wizard shown or commit pending retry).
    pub fn is_resolving(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session for `batch`.
    ///
    /// Without duplicates the batch is committed before returning.
    pub async fn begin(
        &mut self,
        repo: &mut AssetRepo,
        batch: Vec<ReadFile>,
        resolver: CategoryResolver,
    ) -> Result<BeginOutcome, ImportError> {
        if self.session.is_some() {
            return Err(ImportError::ResolutionInProgress);
        }
        if batch.is_empty() {
            return Err(ImportError::NothingToImport);
        }

        let mut partition = detect_duplicates(&batch, repo.library());
        for candidate in &mut partition.duplicates {
            candidate.selected_category = resolver.resolve(&candidate.imported);
        }
        let duplicates = partition.duplicates.len();
        let uniques = partition.uniques.len();

        tracing::info!(duplicates, uniques, "Import batch partitioned");

        self.session = Some(ResolutionSession {
            wizard: WizardState::start(partition.duplicates),
            uniques: partition.uniques,
            resolver,
            baseline_total: repo.library().total_count(),
            implicitly_skipped: 0,
        });

        if duplicates == 0 {
            return self.commit(repo).await.map(BeginOutcome::Committed);
        }

        self.sink.notify(
            Notice::info(
                "import.duplicates_found",
                format!("{duplicates} file(s) already exist. Choose what to do with each."),
            )
            .with_payload(serde_json::json!({ "duplicates": duplicates, "uniques": uniques })),
        );
        Ok(BeginOutcome::Resolving { duplicates, uniques })
    }

    /// All candidates of the open session.
    pub fn candidates(&self) -> &[DuplicateCandidate] {
        self.session
            .as_ref()
            .map(|s| s.wizard.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// The candidate being presented, with local and imported views.
    pub fn presentation(&self) -> Option<Presentation<'_>> {
        let session = self.session.as_ref()?;
        let candidate = session.wizard.current()?;
        Some(Presentation {
            index: session.wizard.cursor,
            total: session.wizard.candidates.len(),
            remaining: session.wizard.remaining(),
            candidate,
            diff: side_by_side(&candidate.local_asset.content, &candidate.imported.content),
        })
    }

    /// Present another unprocessed candidate.
    pub fn select(&mut self, index: usize) -> Result<(), ImportError> {
        let session = self.session.as_mut().ok_or(ImportError::NoActiveSession)?;
        session.wizard.select(index)?;
        Ok(())
    }

    /// Resolve the presented candidate.
    ///
    /// Replace overwrites the local asset right away; if persisting that
    /// fails the candidate stays unresolved. Resolving the last candidate
    /// commits the session.
    pub async fn resolve(
        &mut self,
        repo: &mut AssetRepo,
        action: ResolutionAction,
    ) -> Result<Step, ImportError> {
        let session = self.session.as_mut().ok_or(ImportError::NoActiveSession)?;
        let candidate = session.wizard.current().ok_or_else(|| {
            CoreError::Conflict("No duplicate is being presented".into())
        })?;

        if action == ResolutionAction::Replace {
            let id = candidate.local_asset.id;
            let imported = candidate.imported.clone();
            repo.replace_content(id, &imported).await.inspect_err(|e| {
                tracing::error!(file = %imported.name, error = %e, "Replace failed");
            })?;
            tracing::info!(file = %imported.name, asset_id = id, "Replaced local content");
        }

        let resolved = session.wizard.resolve(action)?;
        tracing::debug!(index = resolved.index, action = %action, "Duplicate resolved");

        match resolved.next {
            Advance::Next(i) => Ok(Step::Next(i)),
            Advance::Done => self.commit(repo).await.map(Step::Committed),
        }
    }

    /// Close the wizard early. Unresolved candidates count as skipped and
    /// the session is committed as usual.
    pub async fn cancel(&mut self, repo: &mut AssetRepo) -> Result<CommitSummary, ImportError> {
        let session = self.session.as_mut().ok_or(ImportError::NoActiveSession)?;
        let skipped = session.wizard.cancel();
        session.implicitly_skipped += skipped;
        if skipped > 0 {
            tracing::info!(skipped, "Wizard cancelled, remaining duplicates skipped");
        }
        self.commit(repo).await
    }

    /// Commit a session whose previous commit failed.
    pub async fn retry_commit(&mut self, repo: &mut AssetRepo) -> Result<CommitSummary, ImportError> {
        if self.session.is_none() {
            return Err(ImportError::NoActiveSession);
        }
        self.commit(repo).await
    }

    /// Drop the open session without committing. Returns how many files
    /// were pending.
    pub fn discard(&mut self) -> Option<usize> {
        let session = self.session.take()?;
        let pending = session.uniques.len()
            + session
                .wizard
                .with_action(ResolutionAction::AddAsNew)
                .count();
        tracing::warn!(pending, "Import session discarded");
        Some(pending)
    }

    async fn commit(&mut self, repo: &mut AssetRepo) -> Result<CommitSummary, ImportError> {
        let session = self.session.as_mut().ok_or(ImportError::NoActiveSession)?;
        session.wizard.begin_commit()?;

        let accepted: Vec<(&ReadFile, Category)> = session
            .wizard
            .with_action(ResolutionAction::AddAsNew)
            .map(|c| (&c.imported, c.selected_category))
            .chain(
                session
                    .uniques
                    .iter()
                    .map(|f| (f, session.resolver.resolve(f))),
            )
            .collect();

        let now = Utc::now();
        let ids = synthesize_ids(now.timestamp_millis(), accepted.len(), &mut rand::rng());
        let assets: Vec<Asset> = accepted
            .iter()
            .zip(ids)
            .map(|((file, category), id)| Asset::from_read_file(file, id, *category, now))
            .collect();
        let expected = assets.len();

        if !assets.is_empty() {
            if let Err(e) = repo.append_batch(assets).await {
                let error = ImportError::Store(e);
                tracing::error!(error = %error, count = expected, "Import commit failed, batch kept for retry");
                self.sink.notify(Notice::error("import.commit_failed", error.user_message()));
                return Err(error);
            }
        }

        let names = |action| -> Vec<String> {
            session
                .wizard
                .with_action(action)
                .map(|c| c.imported.name.clone())
                .collect()
        };
        let skipped_files = names(ResolutionAction::Skip);
        let replaced_files = names(ResolutionAction::Replace);
        let added_as_new_count = session.wizard.with_action(ResolutionAction::AddAsNew).count();
        let baseline = session.baseline_total;
        let implicitly_skipped = session.implicitly_skipped;

        session.wizard.finish();
        self.session = None;

        let verification = verify(repo, baseline, expected).await;
        if let Verification::Mismatch { expected, actual, .. } = verification {
            self.sink.notify(Notice::warning(
                "import.verification_mismatch",
                format!("Expected {expected} new file(s) but found {actual}; reloaded from storage."),
            ));
        }

        let summary = CommitSummary {
            total_imported: expected,
            added_as_new_count,
            skipped_count: skipped_files.len(),
            replaced_count: replaced_files.len(),
            implicitly_skipped,
            skipped_files,
            replaced_files,
            verification,
        };

        tracing::info!(
            imported = summary.total_imported,
            skipped = summary.skipped_count,
            replaced = summary.replaced_count,
            "Import committed"
        );
        self.sink.notify(
            Notice::success("import.committed", commit_message(&summary))
                .with_payload(serde_json::to_value(&summary).unwrap_or_default()),
        );
        Ok(summary)
    }
}

/// Compare the repository's growth since `baseline` with `expected`.
async fn verify(repo: &mut AssetRepo, baseline: usize, expected: usize) -> Verification {
    let actual = repo.stats().total_files as i64 - baseline as i64;
    let expected = expected as i64;
    if actual == expected {
        return Verification::Verified;
    }

    tracing::warn!(expected, actual, "Import count mismatch, reloading from storage");
    let reloaded = match repo.reload().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Reload after mismatch failed");
            false
        }
    };
    Verification::Mismatch {
        expected,
        actual,
        reloaded,
    }
}

fn commit_message(summary: &CommitSummary) -> String {
    let mut message = format!("Imported {} file(s)", summary.total_imported);
    if summary.replaced_count > 0 {
        message.push_str(&format!(", replaced {}", summary.replaced_count));
    }
    if summary.skipped_count > 0 {
        message.push_str(&format!(", skipped {}", summary.skipped_count));
    }
    message
}
