use std::path::Path;

use anyhow::{Context, Result};
use dbimport_core::config::{load_import_config, ImportConfig};
use dbimport_core::db::ProgramDb;

use crate::canonicalize_or_current;

/// Open an existing program database, resolving the path against the cwd.
pub fn open_program_db(program: &str) -> Result<ProgramDb> {
    let db_path = canonicalize_or_current(program)?;
    ProgramDb::open(&db_path)
        .with_context(|| format!("Failed to open program database at {}", db_path.display()))
}

/// Load the import config if a path was given, otherwise use defaults.
pub fn resolve_import_config(config: Option<&str>) -> Result<ImportConfig> {
    match config {
        Some(path) => load_import_config(Path::new(path)),
        None => Ok(ImportConfig::default()),
    }
}
