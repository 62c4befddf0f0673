//! `hoard-pipeline` -- the async import side of the organizer.
//!
//! - [`reader`] -- the [`FileReader`](reader::FileReader) capability and
//!   batch reading.
//! - [`engine`] -- [`DuplicateResolutionEngine`](engine::DuplicateResolutionEngine):
//!   partition, wizard session, commit with rollback, verification.
//! - [`image_pipeline`] -- per-image decode, compress, quota check, commit.
//! - [`orchestrator`] -- the three import entry points, cooldowns, staging.

pub mod config;
pub mod engine;
pub mod error;
pub mod image_pipeline;
pub mod orchestrator;
pub mod reader;

pub use config::ImportConfig;
pub use engine::{CategoryResolver, CommitSummary, DuplicateResolutionEngine};
pub use error::ImportError;
pub use image_pipeline::{FixedDecision, ImageImportPipeline, QuotaDecision, QuotaPrompt, RasterCodec};
pub use orchestrator::{EntryPoint, ImportOrchestrator, ImportReport, ImportResult, Repositories, TextOutcome};
pub use reader::{FileHandle, FileReader, FsReader};
