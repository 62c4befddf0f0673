//! `hoard-core` -- pure domain logic for the personal asset organizer.
//!
//! Nothing in this crate performs I/O or awaits. Storage lives in
//! `hoard-db`, async file reading and the import workflow in
//! `hoard-pipeline`.

pub mod asset;
pub mod backup;
pub mod category;
pub mod classify;
pub mod content;
pub mod diff;
pub mod duplicate;
pub mod error;
pub mod ids;
pub mod image;
pub mod library;
pub mod staging;
pub mod types;
pub mod wizard;
