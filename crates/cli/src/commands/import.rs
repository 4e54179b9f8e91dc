use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use dbimport_core::db::ImportRunRecord;
use dbimport_core::import::{load_input, ImportError, ImportSummary, Importer};

use crate::commands::{open_program_db, resolve_import_config};
use crate::sha256_hex;

/// Import an x64dbg JSON database into a program database.
///
/// Returns `Ok(None)` when no database file was chosen; nothing is changed.
pub fn import_command(
    program: &str,
    database: Option<&str>,
    config: Option<&str>,
    json: bool,
) -> Result<Option<ImportSummary>> {
    let mut db = open_program_db(program)?;
    let config = resolve_import_config(config)?;

    let input = match load_input(database.map(Path::new)) {
        Ok(input) => input,
        Err(ImportError::InputCancelled) => {
            eprintln!("[-] Import cancelled.");
            return Ok(None);
        }
        Err(err) => return Err(err).context("Failed to load database file"),
    };

    let started_at = Utc::now().to_rfc3339();
    let source = input.source();
    let summary = Importer::new(config).run(&input.store, &mut db, &source);

    let record = ImportRunRecord {
        source_path: source,
        source_hash: Some(sha256_hex(&input.bytes)),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        summary: summary.clone(),
    };
    db.insert_import_run(&record).context("Failed to record import run")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("[+] Imported {} new comments", summary.comments.imported);
        println!("[+] Imported {} new bookmarks", summary.bookmarks.imported);
        println!(
            "[+] Imported {} new symbols ({} functions, {} labels)",
            summary.symbols.imported(),
            summary.symbols.functions,
            summary.symbols.labels
        );
        if summary.total_skipped() > 0 {
            println!("[!] Skipped {} records:", summary.total_skipped());
        }
        println!("{}", summary);
    }

    Ok(Some(summary))
}
