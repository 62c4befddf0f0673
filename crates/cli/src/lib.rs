//! `hoard-cli` -- terminal front end for the asset organizer.
//!
//! Parses commands, wires the SQLite-backed repositories to the import
//! pipeline, and asks the user for duplicate and quota decisions.

pub mod commands;
pub mod config;
pub mod prompt;
pub mod render;
