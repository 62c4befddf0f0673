//! Command-line surface of the organizer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use hoard_core::backup::{backup_file_name, image_backup_file_name};
use hoard_core::category::Category;
use hoard_core::duplicate::ResolutionAction;
use hoard_core::types::AssetId;
use hoard_db::ContentStore;
use hoard_events::NotificationSink;
use hoard_pipeline::engine::{CommitSummary, Step};
use hoard_pipeline::image_pipeline::{QuotaDecision, QuotaPrompt, RasterCodec};
use hoard_pipeline::reader::{FileHandle, FsReader};
use hoard_pipeline::{
    EntryPoint, ImportConfig, ImportError, ImportOrchestrator, ImportReport, ImportResult,
    Repositories, TextOutcome,
};

use crate::prompt::{Choice, FixedPolicy, ResolutionPrompt, StdinPrompt};
use crate::render;

#[derive(Parser, Debug)]
#[command(name = "hoard", version, about = "Local asset organizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// How duplicates are decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Ask for each duplicate
    Ask,
    Skip,
    /// Keep both copies
    Add,
    Replace,
}

impl DuplicatePolicy {
    fn action(self) -> Option<ResolutionAction> {
        match self {
            Self::Ask => None,
            Self::Skip => Some(ResolutionAction::Skip),
            Self::Add => Some(ResolutionAction::AddAsNew),
            Self::Replace => Some(ResolutionAction::Replace),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import files into one category; images go to the image library
    Import {
        paths: Vec<PathBuf>,
        #[arg(short, long, default_value = "items")]
        category: Category,
        #[arg(long, value_enum, default_value = "ask")]
        on_duplicate: DuplicatePolicy,
        /// Raise the image storage limit without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Stage files for a later `confirm`; images are imported right away
    Stage {
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        yes: bool,
    },

    /// Staging list operations
    #[command(subcommand)]
    Staged(StagedCommand),

    /// Import everything staged, each file into its chosen category
    Confirm {
        #[arg(long, value_enum, default_value = "ask")]
        on_duplicate: DuplicatePolicy,
    },

    /// List assets, favorites first
    List {
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Case-insensitive search over names and content
    Search { query: String },

    /// Print an asset's content
    Show { id: AssetId },

    Stats,

    Favorite { id: AssetId },

    Move { id: AssetId, category: Category },

    Rename { id: AssetId, name: String },

    Delete { id: AssetId },

    /// Delete every asset
    Clear {
        #[arg(long)]
        yes: bool,
    },

    /// Write a JSON backup of all assets
    Export { path: Option<PathBuf> },

    /// Replace all assets with a JSON backup
    Restore { path: PathBuf },

    /// Image library operations
    #[command(subcommand)]
    Images(ImageCommand),
}

#[derive(Subcommand, Debug)]
pub enum StagedCommand {
    List,
    /// Choose the target category of a staged file
    Category { id: u64, category: Category },
    Remove { id: u64 },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    List,
    Search { query: String },
    Stats,
    Favorite { id: AssetId },
    Rename { id: AssetId, name: String },
    Delete { id: AssetId },
    Clear {
        #[arg(long)]
        yes: bool,
    },
    Export { path: Option<PathBuf> },
    /// Change compression settings
    Config {
        #[arg(long)]
        compress: Option<bool>,
        /// JPEG quality between 0.0 and 1.0
        #[arg(long)]
        quality: Option<f32>,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_storage: Option<u64>,
    },
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run one command against `store`.
pub async fn run(
    cli: Cli,
    store: Arc<dyn ContentStore>,
    config: ImportConfig,
    sink: Arc<dyn NotificationSink>,
) -> anyhow::Result<()> {
    let mut repos = Repositories::load(store).await?;
    if let Some(diagnostic) = repos.assets.take_diagnostic() {
        println!("Stored assets could not be read ({diagnostic}); starting empty.");
    }

    let stdin = Arc::new(StdinPrompt::default());
    let (quota, resolver): (Arc<dyn QuotaPrompt>, Arc<dyn ResolutionPrompt>) = match &cli.command {
        Command::Import { on_duplicate, yes, .. } => policy(*on_duplicate, *yes, &stdin),
        Command::Stage { yes, .. } => policy(DuplicatePolicy::Ask, *yes, &stdin),
        Command::Confirm { on_duplicate } => policy(*on_duplicate, false, &stdin),
        _ => {
            let quota: Arc<dyn QuotaPrompt> = stdin.clone();
            let resolver: Arc<dyn ResolutionPrompt> = stdin.clone();
            (quota, resolver)
        }
    };
    let mut orchestrator = ImportOrchestrator::new(
        config,
        Arc::new(FsReader),
        Arc::new(RasterCodec),
        quota,
        sink,
    );

    execute(cli.command, &mut repos, &mut orchestrator, resolver.as_ref()).await
}

fn policy(
    on_duplicate: DuplicatePolicy,
    yes: bool,
    stdin: &Arc<StdinPrompt>,
) -> (Arc<dyn QuotaPrompt>, Arc<dyn ResolutionPrompt>) {
    let quota: Arc<dyn QuotaPrompt> = if yes {
        Arc::new(FixedPolicy {
            action: ResolutionAction::Skip,
            quota: QuotaDecision::Proceed,
        })
    } else {
        stdin.clone()
    };
    let resolver: Arc<dyn ResolutionPrompt> = match on_duplicate.action() {
        Some(action) => Arc::new(FixedPolicy {
            action,
            quota: QuotaDecision::Abort,
        }),
        None => stdin.clone(),
    };
    (quota, resolver)
}

/// Execute a parsed command with prepared collaborators.
pub async fn execute(
    command: Command,
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<()> {
    match command {
        Command::Import { paths, category, .. } => {
            let handles = handles_for(&paths).await?;
            let result = orchestrator
                .handle_file_picker(repos, handles, category)
                .await?;
            finish_import(result, repos, orchestrator, prompt).await?;
        }
        Command::Stage { paths, .. } => {
            let handles = handles_for(&paths).await?;
            let result = orchestrator
                .handle_drop(repos, EntryPoint::PageDrop, handles)
                .await?;
            finish_import(result, repos, orchestrator, prompt).await?;
            for file in &repos.staging.staging().dragged_files {
                println!("{}", render::staged_row(file));
            }
        }
        Command::Staged(command) => staged(command, repos, orchestrator).await?,
        Command::Confirm { .. } => {
            let report = orchestrator.confirm_staged_import(repos).await?;
            finish_import(ImportResult::Processed(report), repos, orchestrator, prompt).await?;
        }
        Command::List { category } => {
            let library = repos.assets.library();
            let categories = category.map(|c| vec![c]).unwrap_or_else(|| Category::ALL.to_vec());
            for category in categories {
                for asset in library.list(category) {
                    println!("{}", render::asset_row(asset));
                }
            }
        }
        Command::Search { query } => {
            for asset in repos.assets.library().search(&query) {
                println!("{}", render::asset_row(asset));
            }
        }
        Command::Show { id } => {
            let asset = repos
                .assets
                .find_by_id(id)
                .with_context(|| format!("No asset with id {id}"))?;
            println!("{}", asset.content);
        }
        Command::Stats => println!("{}", render::library_stats(&repos.assets.stats())),
        Command::Favorite { id } => {
            let favorite = repos.assets.toggle_favorite(id).await?;
            println!("{}", if favorite { "Marked as favorite" } else { "Unmarked" });
        }
        Command::Move { id, category } => {
            repos.assets.move_to(id, category).await?;
            println!("Moved to {category}");
        }
        Command::Rename { id, name } => {
            repos.assets.rename(id, &name).await?;
            println!("Renamed");
        }
        Command::Delete { id } => {
            let asset = repos.assets.delete(id).await?;
            println!("Deleted {}", asset.name);
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every asset without --yes");
            }
            repos.assets.clear().await?;
            println!("All assets deleted");
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| backup_file_name(Utc::now()).into());
            write_file(&path, &repos.assets.export_backup()?).await?;
        }
        Command::Restore { path } => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let total = repos.assets.import_backup(&json).await?;
            println!("Restored {total} asset(s)");
        }
        Command::Images(command) => images(command, repos).await?,
    }
    Ok(())
}

async fn handles_for(paths: &[PathBuf]) -> anyhow::Result<Vec<FileHandle>> {
    if paths.is_empty() {
        bail!("No files given");
    }
    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        handles.push(FileHandle::from_path(path).await?);
    }
    Ok(handles)
}

async fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn finish_import(
    result: ImportResult,
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<()> {
    let ImportReport {
        images,
        text,
        failed_reads,
    } = match result {
        ImportResult::Debounced => return Ok(()),
        ImportResult::Processed(report) => report,
    };

    if let Some(line) = render::image_report(&images) {
        println!("{line}");
    }
    for name in &failed_reads {
        println!("Could not read {name}");
    }

    match text {
        TextOutcome::NothingToImport => {}
        TextOutcome::Staged { ids, already_staged } => {
            println!("Staged {} file(s)", ids.len());
            if already_staged > 0 {
                println!("{already_staged} file(s) were already staged");
            }
        }
        TextOutcome::Committed(summary) => println!("{}", render::commit_summary(&summary)),
        TextOutcome::AwaitingResolution { duplicates, uniques } => {
            println!("{duplicates} duplicate(s), {uniques} new file(s)");
            let summary = drive_wizard(repos, orchestrator, prompt).await?;
            println!("{}", render::commit_summary(&summary));
        }
    }
    Ok(())
}

/// Ask for a decision on every duplicate until the session commits.
pub async fn drive_wizard(
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<CommitSummary> {
    loop {
        let (screen, pending) = match orchestrator.presentation() {
            Some(p) => {
                let pending: Vec<usize> = orchestrator
                    .candidates()
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.processed)
                    .map(|(i, _)| i)
                    .collect();
                (render::presentation(&p), pending)
            }
            None => return commit_with_retry(repos, orchestrator, prompt).await,
        };

        let outcome = match prompt.choose(&screen, &pending).await {
            Choice::Select(index) => {
                if let Err(e) = orchestrator.select(index) {
                    println!("{e}");
                }
                continue;
            }
            Choice::Cancel => orchestrator.cancel_resolution(repos).await.map(Step::Committed),
            Choice::Resolve(action) => orchestrator.resolve(repos, action).await,
        };

        match outcome {
            Ok(Step::Next(_)) => {}
            Ok(Step::Committed(summary)) => return Ok(summary),
            Err(e) if orchestrator.is_resolving() && orchestrator.presentation().is_none() => {
                // Every candidate is decided; only the commit failed.
                return retry_failed_commit(e, repos, orchestrator, prompt).await;
            }
            Err(e) => {
                if !prompt.keep_resolving(&e.user_message()).await {
                    return stop_resolving(e, repos, orchestrator, prompt).await;
                }
            }
        }
    }
}

/// Close the wizard after a decision failed and cannot be changed. The
/// remaining candidates count as skipped; the failure is still returned.
async fn stop_resolving(
    error: ImportError,
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<CommitSummary> {
    tracing::warn!(error = %error, "Duplicate resolution stopped");
    let summary = match orchestrator.cancel_resolution(repos).await {
        Ok(summary) => summary,
        Err(e) => retry_failed_commit(e, repos, orchestrator, prompt).await?,
    };
    println!("{}", render::commit_summary(&summary));
    Err(error.into())
}

async fn commit_with_retry(
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<CommitSummary> {
    match orchestrator.retry_commit(repos).await {
        Ok(summary) => Ok(summary),
        Err(e) => retry_failed_commit(e, repos, orchestrator, prompt).await,
    }
}

async fn retry_failed_commit(
    mut error: ImportError,
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
    prompt: &dyn ResolutionPrompt,
) -> anyhow::Result<CommitSummary> {
    while prompt.retry_commit(&error.user_message()).await {
        match orchestrator.retry_commit(repos).await {
            Ok(summary) => return Ok(summary),
            Err(e) => error = e,
        }
    }
    if let Some(pending) = orchestrator.discard_resolution() {
        tracing::warn!(pending, "Import abandoned after failed commit");
    }
    Err(error.into())
}

async fn staged(
    command: StagedCommand,
    repos: &mut Repositories,
    orchestrator: &mut ImportOrchestrator,
) -> anyhow::Result<()> {
    match command {
        StagedCommand::List => {
            for file in &repos.staging.staging().dragged_files {
                println!("{}", render::staged_row(file));
            }
            let stats = repos.staging.stats();
            println!("{} file(s), {} B", stats.count, stats.total_size);
        }
        StagedCommand::Category { id, category } => {
            orchestrator.set_staged_category(repos, id, category).await?;
        }
        StagedCommand::Remove { id } => {
            if !orchestrator.remove_staged(repos, id).await? {
                bail!("No staged file with id {id}");
            }
        }
        StagedCommand::Clear => orchestrator.clear_staging(repos).await?,
    }
    Ok(())
}

async fn images(command: ImageCommand, repos: &mut Repositories) -> anyhow::Result<()> {
    let images = &mut repos.images;
    match command {
        ImageCommand::List => {
            for image in images.images() {
                println!("{}", render::image_row(image));
            }
        }
        ImageCommand::Search { query } => {
            for image in images.collection().search(&query) {
                println!("{}", render::image_row(image));
            }
        }
        ImageCommand::Stats => println!(
            "{}",
            render::image_stats(&images.stats(), images.config().max_storage_size)
        ),
        ImageCommand::Favorite { id } => {
            let favorite = images.toggle_favorite(id).await?;
            println!("{}", if favorite { "Marked as favorite" } else { "Unmarked" });
        }
        ImageCommand::Rename { id, name } => {
            if !images.rename(id, &name).await? {
                println!("Name unchanged");
            }
        }
        ImageCommand::Delete { id } => {
            let image = images.delete(id).await?;
            println!("Deleted {}", image.name);
        }
        ImageCommand::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every image without --yes");
            }
            images.clear().await?;
        }
        ImageCommand::Export { path } => {
            let path = path.unwrap_or_else(|| image_backup_file_name(Utc::now()).into());
            write_file(&path, &images.export()?).await?;
        }
        ImageCommand::Config {
            compress,
            quality,
            max_width,
            max_storage,
        } => {
            let mut config = images.config().clone();
            if let Some(compress) = compress {
                config.use_compression = compress;
            }
            if let Some(quality) = quality {
                if !(0.0..=1.0).contains(&quality) {
                    bail!("Quality must be between 0.0 and 1.0");
                }
                config.compression_quality = quality;
            }
            if let Some(max_width) = max_width {
                config.max_image_width = max_width;
            }
            if let Some(max_storage) = max_storage {
                config.max_storage_size = max_storage;
            }
            images.update_config(config).await?;
            println!("{}", serde_json::to_string_pretty(images.config())?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_import_with_policy() {
        let cli = Cli::try_parse_from([
            "hoard",
            "import",
            "a.txt",
            "b.txt",
            "--category",
            "skills",
            "--on-duplicate",
            "replace",
        ])
        .unwrap();
        assert_matches!(
            cli.command,
            Command::Import { paths, category: Category::Skills, on_duplicate: DuplicatePolicy::Replace, yes: false }
                if paths.len() == 2
        );
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(Cli::try_parse_from(["hoard", "move", "1", "weapons"]).is_err());
    }

    #[test]
    fn parses_staged_subcommands() {
        let cli = Cli::try_parse_from(["hoard", "staged", "category", "3", "talents"]).unwrap();
        assert_matches!(
            cli.command,
            Command::Staged(StagedCommand::Category { id: 3, category: Category::Talents })
        );
    }

    #[test]
    fn policy_actions() {
        assert_eq!(DuplicatePolicy::Ask.action(), None);
        assert_eq!(DuplicatePolicy::Add.action(), Some(ResolutionAction::AddAsNew));
    }
}
