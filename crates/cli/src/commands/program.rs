use anyhow::{anyhow, Context, Result};
use dbimport_core::db::{ImportRunRecord, ProgramDb, ProgramInfo};
use dbimport_core::model::{Address, Bookmark, Symbol};
use serde::Serialize;

use crate::commands::open_program_db;
use crate::{canonicalize_or_current, parse_address_arg};

#[derive(Serialize)]
pub struct CommentEntry {
    pub address: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct ProgramSnapshot {
    pub program: ProgramInfo,
    pub comments: Vec<CommentEntry>,
    pub bookmarks: Vec<Bookmark>,
    pub symbols: Vec<Symbol>,
}

/// Create (or re-initialize) a program database.
pub fn init_program_command(
    program: &str,
    name: &str,
    base: &str,
    pointer_size: u8,
) -> Result<()> {
    if !matches!(pointer_size, 4 | 8) {
        return Err(anyhow!("Invalid pointer size {}. Allowed: 4, 8", pointer_size));
    }
    let image_base = parse_address_arg(base)?;
    let db_path = canonicalize_or_current(program)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let info = ProgramInfo::new(name, Address(image_base)).with_pointer_size(pointer_size);
    if info.image_base.value() > info.address_limit() {
        return Err(anyhow!(
            "Image base {} does not fit a {}-byte address space",
            info.image_base,
            pointer_size
        ));
    }
    ProgramDb::create(&db_path, &info).with_context(|| {
        format!("Failed to initialize program database at {}", db_path.display())
    })?;

    println!("Initialized program database:");
    println!("  Name: {}", info.name);
    println!("  Image base: {}", info.image_base);
    println!("  Pointer size: {}", info.pointer_size);
    println!("  DB: {}", db_path.display());

    Ok(())
}

/// Print the program identity and all annotations.
pub fn show_program_command(program: &str, json: bool) -> Result<()> {
    let db = open_program_db(program)?;
    let comments = db.list_comments().context("Failed to list comments")?;
    let bookmarks = db.list_bookmarks().context("Failed to list bookmarks")?;
    let symbols = db.list_symbols().context("Failed to list symbols")?;

    if json {
        let snapshot = ProgramSnapshot {
            program: db.info().clone(),
            comments: comments
                .into_iter()
                .map(|(address, text)| CommentEntry { address: address.to_string(), text })
                .collect(),
            bookmarks,
            symbols,
        };
        let serialized = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize program to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    let info = db.info();
    println!(
        "Program: {} (base {}, {}-byte pointers)",
        info.name, info.image_base, info.pointer_size
    );

    println!("Comments ({}):", comments.len());
    for (address, text) in &comments {
        let mut lines = text.lines();
        println!("  {}: {}", address, lines.next().unwrap_or(""));
        for line in lines {
            println!("  {:>width$}  {}", "", line, width = address.to_string().len());
        }
    }

    println!("Bookmarks ({}):", bookmarks.len());
    for bookmark in &bookmarks {
        println!("  {} [{}] {}", bookmark.address, bookmark.category, bookmark.description);
    }

    println!("Symbols ({}):", symbols.len());
    for symbol in &symbols {
        println!(
            "  {} {} [{}; {}]",
            symbol.address,
            symbol.name,
            symbol.kind.as_str(),
            symbol.source.as_str()
        );
    }

    Ok(())
}

/// List the import history stored in the program database.
pub fn list_imports_command(program: &str, json: bool) -> Result<()> {
    let db = open_program_db(program)?;
    let runs: Vec<ImportRunRecord> = db.list_import_runs().context("Failed to list import runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    println!("Imports ({}):", runs.len());
    if runs.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for run in runs {
        println!(
            "  - {} at {} hash={} imported={} skipped={}",
            run.source_path,
            run.finished_at,
            run.source_hash.as_deref().unwrap_or("-"),
            run.summary.total_imported(),
            run.summary.total_skipped()
        );
    }

    Ok(())
}
