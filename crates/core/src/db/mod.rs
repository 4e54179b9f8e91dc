//! Program database: a SQLite store implementing `TargetProgram`.
//!
//! This module provides:
//! - `ProgramDb`: SQLite wrapper with schema migrations and annotation tables.
//! - `ProgramInfo`: the identity row (module name, image base, pointer size).
//! - `ImportRunRecord`: bookkeeping for each import applied to the database.

mod models;
mod program_db;

pub use models::*;
pub use program_db::*;
