//! Repositories own the in-memory copy of one persisted document each.
//!
//! Mutating operations persist immediately. When persisting fails the
//! in-memory change is undone, so memory never runs ahead of the store.

pub mod asset_repo;
pub mod image_repo;
pub mod staging_repo;

pub use asset_repo::AssetRepo;
pub use image_repo::ImageRepo;
pub use staging_repo::StagingRepo;
