//! Target program interface.
//!
//! The importer never reaches into global program state. Everything it reads or
//! writes goes through `TargetProgram`, which exposes exactly the operations the
//! merge policies need:
//! - identity (module name, load base, highest valid address)
//! - end-of-line comments
//! - bookmarks
//! - symbols (lookup, rename, label creation, function creation)
//! - user-facing progress and error reporting
//!
//! `MemoryProgram` is an in-memory implementation for tests and dry runs; the
//! SQLite-backed `ProgramDb` lives in `crate::db`.

pub mod memory;

pub use memory::MemoryProgram;

use thiserror::Error;

use crate::db::DbError;
use crate::model::{Address, Bookmark, Symbol, SymbolSource};

/// A single read or write against the target program failed.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Program database error: {0}")]
    Db(#[from] DbError),

    #[error("Program rejected change at {address}: {reason}")]
    Rejected { address: Address, reason: String },
}

pub type TargetResult<T> = Result<T, TargetError>;

/// Annotation state of the program being imported into.
pub trait TargetProgram {
    /// Module name as the debugger records it (e.g. `target.exe`).
    fn name(&self) -> &str;

    /// Absolute address the module is loaded at.
    fn image_base(&self) -> Address;

    /// Highest valid absolute address.
    fn address_limit(&self) -> u64 {
        u64::MAX
    }

    fn eol_comment(&self, address: Address) -> TargetResult<Option<String>>;

    /// Replace the end-of-line comment at `address`.
    fn set_eol_comment(&mut self, address: Address, text: &str) -> TargetResult<()>;

    fn bookmarks(&self, address: Address) -> TargetResult<Vec<Bookmark>>;

    fn create_bookmark(
        &mut self,
        address: Address,
        category: &str,
        description: &str,
    ) -> TargetResult<()>;

    fn symbol(&self, address: Address) -> TargetResult<Option<Symbol>>;

    fn rename_symbol(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
    ) -> TargetResult<()>;

    fn create_label(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
        global: bool,
    ) -> TargetResult<()>;

    /// Define a function at `address`. The program derives the body itself.
    fn create_function(&mut self, address: Address, name: &str) -> TargetResult<()>;

    fn report_info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn report_error(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
