//! Import driver: runs the comment, bookmark, and symbol passes in order.
//!
//! Only two things stop a run outright: no input file was chosen, or the
//! input document could not be decoded. Both happen before the target is
//! touched. Everything after that is per record: an out-of-range address or a
//! rejected write skips that one record, gets reported, and the pass carries on.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::address::AddressTranslator;
use crate::config::ImportConfig;
use crate::merge::{apply_bookmark, apply_comment, apply_symbol, MergeOutcome, SymbolTable};
use crate::model::SymbolKind;
use crate::records::{FormatError, RecordStore};
use crate::target::TargetProgram;

#[derive(Debug, Error)]
pub enum ImportError {
    /// No input file was chosen.
    #[error("Import cancelled.")]
    InputCancelled,

    #[error("Database file not found: {0}")]
    MissingInput(PathBuf),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Resolve the user's file choice, telling "nothing chosen" apart from a bad path.
pub fn select_input(choice: Option<&Path>) -> Result<PathBuf, ImportError> {
    let path = choice.ok_or(ImportError::InputCancelled)?;
    if !path.is_file() {
        return Err(ImportError::MissingInput(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// A chosen database file, read once and decoded.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    /// Raw document bytes, kept for hashing.
    pub bytes: Vec<u8>,
    pub store: RecordStore,
}

impl LoadedInput {
    /// Path as it appears in bookmark descriptions.
    pub fn source(&self) -> String {
        self.path.display().to_string()
    }
}

/// Select, read, and decode the input without touching any target.
pub fn load_input(choice: Option<&Path>) -> Result<LoadedInput, ImportError> {
    let path = select_input(choice)?;
    let bytes = fs::read(&path).map_err(FormatError::from)?;
    let store = RecordStore::from_slice(&bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "database decoded");
    Ok(LoadedInput { path, bytes, store })
}

/// Counts for the comment or bookmark pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub parsed: usize,
    pub imported: usize,
    pub already_present: usize,
    /// Records for a different module.
    pub filtered: usize,
    pub out_of_range: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn skipped(&self) -> usize {
        self.out_of_range + self.failed
    }
}

/// Counts for the symbol pass, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub parsed: usize,
    pub functions: usize,
    pub labels: usize,
    pub already_named: usize,
    pub filtered: usize,
    pub out_of_range: usize,
    pub failed: usize,
}

impl SymbolSummary {
    pub fn imported(&self) -> usize {
        self.functions + self.labels
    }

    pub fn skipped(&self) -> usize {
        self.out_of_range + self.failed
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub comments: PassSummary,
    pub bookmarks: PassSummary,
    pub symbols: SymbolSummary,
}

impl ImportSummary {
    pub fn total_imported(&self) -> usize {
        self.comments.imported + self.bookmarks.imported + self.symbols.imported()
    }

    pub fn total_skipped(&self) -> usize {
        self.comments.skipped() + self.bookmarks.skipped() + self.symbols.skipped()
    }

    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.total_imported() == 0
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, pass) in [("Comments", &self.comments), ("Bookmarks", &self.bookmarks)] {
            writeln!(
                f,
                "{label}: {} imported, {} already present, {} other module, {} out of range, {} failed",
                pass.imported, pass.already_present, pass.filtered, pass.out_of_range, pass.failed
            )?;
        }
        write!(
            f,
            "Symbols: {} functions, {} labels imported, {} already named, {} other module, {} out of range, {} failed",
            self.symbols.functions,
            self.symbols.labels,
            self.symbols.already_named,
            self.symbols.filtered,
            self.symbols.out_of_range,
            self.symbols.failed
        )
    }
}

/// Applies a decoded database to a target program.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    pub config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Run every enabled pass. `source` names the input in bookmark descriptions.
    pub fn run<T: TargetProgram + ?Sized>(
        &self,
        store: &RecordStore,
        target: &mut T,
        source: &str,
    ) -> ImportSummary {
        let translator =
            AddressTranslator::new(target.image_base()).with_limit(target.address_limit());
        info!(program = target.name(), base = %translator.base, "starting import");

        let mut summary = ImportSummary::default();
        if self.config.import_comments {
            summary.comments = self.import_comments(store, target, &translator);
        }
        if self.config.import_bookmarks {
            summary.bookmarks = self.import_bookmarks(store, target, &translator, source);
        }
        if self.config.import_symbols {
            summary.symbols = self.import_symbols(store, target, &translator);
        }
        summary
    }

    fn import_comments<T: TargetProgram + ?Sized>(
        &self,
        store: &RecordStore,
        target: &mut T,
        translator: &AddressTranslator,
    ) -> PassSummary {
        let records = store.comments();
        let mut pass = PassSummary { parsed: records.len(), ..PassSummary::default() };
        target.report_info(&format!("Parsing {} comments", records.len()));

        let program = target.name().to_string();
        for record in records {
            if !self.config.module_matches(&record.module, &program) {
                pass.filtered += 1;
                continue;
            }
            let address = match translator.translate(record.address) {
                Ok(address) => address,
                Err(err) => {
                    target.report_error(&format!("Skipping comment: {err}"));
                    pass.out_of_range += 1;
                    continue;
                }
            };
            match apply_comment(target, address, &record.text, self.config.comment_match) {
                Ok(MergeOutcome::Applied) => {
                    debug!(%address, "comment imported");
                    pass.imported += 1;
                }
                Ok(MergeOutcome::AlreadyPresent) => pass.already_present += 1,
                Err(err) => {
                    target.report_error(&format!("Failed to set comment at {address}: {err}"));
                    pass.failed += 1;
                }
            }
        }

        target.report_info(&format!("Imported {} new comments", pass.imported));
        pass
    }

    fn import_bookmarks<T: TargetProgram + ?Sized>(
        &self,
        store: &RecordStore,
        target: &mut T,
        translator: &AddressTranslator,
        source: &str,
    ) -> PassSummary {
        let records = store.bookmarks();
        let mut pass = PassSummary { parsed: records.len(), ..PassSummary::default() };
        target.report_info(&format!("Parsing {} bookmarks", records.len()));

        let description = self.config.bookmark_description(source);
        for record in records {
            let address = match translator.translate(record.address) {
                Ok(address) => address,
                Err(err) => {
                    target.report_error(&format!("Skipping bookmark: {err}"));
                    pass.out_of_range += 1;
                    continue;
                }
            };
            match apply_bookmark(target, address, &self.config.bookmark_category, &description) {
                Ok(MergeOutcome::Applied) => {
                    debug!(%address, "bookmark imported");
                    pass.imported += 1;
                }
                Ok(MergeOutcome::AlreadyPresent) => pass.already_present += 1,
                Err(err) => {
                    target.report_error(&format!("Failed to bookmark {address}: {err}"));
                    pass.failed += 1;
                }
            }
        }

        target.report_info(&format!("Imported {} new bookmarks", pass.imported));
        pass
    }

    fn import_symbols<T: TargetProgram + ?Sized>(
        &self,
        store: &RecordStore,
        target: &mut T,
        translator: &AddressTranslator,
    ) -> SymbolSummary {
        let program = target.name().to_string();
        let table = SymbolTable::build(store.labels(), store.functions(), |module| {
            self.config.module_matches(module, &program)
        });
        let mut pass =
            SymbolSummary { parsed: table.len(), filtered: table.filtered, ..Default::default() };
        target.report_info(&format!(
            "Parsing {} labels and {} functions",
            store.labels().len(),
            store.functions().len()
        ));

        for (rva, name, is_function) in table.entries() {
            let address = match translator.translate(rva) {
                Ok(address) => address,
                Err(err) => {
                    target.report_error(&format!("Skipping symbol '{name}': {err}"));
                    pass.out_of_range += 1;
                    continue;
                }
            };
            match apply_symbol(
                target,
                address,
                name,
                is_function,
                &self.config.placeholder_prefixes,
            ) {
                Ok(Some(SymbolKind::Function)) => {
                    debug!(%address, name, "function named");
                    pass.functions += 1;
                }
                Ok(Some(SymbolKind::Label)) => {
                    debug!(%address, name, "label named");
                    pass.labels += 1;
                }
                Ok(None) => pass.already_named += 1,
                Err(err) => {
                    target.report_error(&format!("Failed to name {address} '{name}': {err}"));
                    pass.failed += 1;
                }
            }
        }

        target.report_info(&format!(
            "Imported {} new symbols ({} functions, {} labels)",
            pass.imported(),
            pass.functions,
            pass.labels
        ));
        pass
    }
}

/// Select, decode, and import a database file in one step.
///
/// Fails without touching `target` if no file was chosen or the document is
/// malformed.
pub fn import_file<T: TargetProgram + ?Sized>(
    choice: Option<&Path>,
    target: &mut T,
    config: ImportConfig,
) -> Result<ImportSummary, ImportError> {
    let input = match load_input(choice) {
        Ok(input) => input,
        Err(err) => {
            target.report_error(&err.to_string());
            return Err(err);
        }
    };
    Ok(Importer::new(config).run(&input.store, target, &input.source()))
}
