//! dbimport-core
//!
//! Core library for importing x64dbg annotation databases (comments, bookmarks,
//! labels, function entries) into a program database.
//!
//! This crate holds the record store, address translation, merge policies, the
//! import driver, and a SQLite-backed program database. Frontends only select
//! files and print results.

pub mod address;
pub mod config;
pub mod db;
pub mod import;
pub mod merge;
pub mod model;
pub mod records;
pub mod target;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
