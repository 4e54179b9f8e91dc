//! Label and function naming.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{Address, Rva, Symbol, SymbolKind, SymbolSource};
use crate::records::{FunctionRecord, LabelRecord};
use crate::target::{TargetProgram, TargetResult};

/// Name prefixes the target program uses for its own placeholder symbols.
///
/// A symbol whose name starts with one of these may be replaced by an imported
/// name; any other name is treated as deliberate and left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderPrefixes(Vec<String>);

impl PlaceholderPrefixes {
    /// Label, data, function, and pointer placeholders.
    pub const DEFAULT: [&'static str; 4] = ["LAB_", "DAT_", "FUN_", "PTR_"];

    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        self.0.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for PlaceholderPrefixes {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// What to do with one `(address, name)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolAction {
    /// Address already has a non-placeholder name.
    Keep,
    RenameFunction,
    CreateFunction,
    RenameLabel,
    CreateLabel,
}

impl SymbolAction {
    /// Kind tallied for the summary, if the action changes anything.
    pub fn kind(&self) -> Option<SymbolKind> {
        match self {
            SymbolAction::Keep => None,
            SymbolAction::RenameFunction | SymbolAction::CreateFunction => {
                Some(SymbolKind::Function)
            }
            SymbolAction::RenameLabel | SymbolAction::CreateLabel => Some(SymbolKind::Label),
        }
    }
}

/// Decide how to name `existing`'s address as `name`.
///
/// An address already carrying `name` is settled even when `name` looks like a
/// placeholder (`DAT_config`); at a function start it must also be a function.
pub fn plan_symbol(
    existing: Option<&Symbol>,
    name: &str,
    is_function: bool,
    prefixes: &PlaceholderPrefixes,
) -> SymbolAction {
    if let Some(symbol) = existing {
        let settled =
            symbol.name == name && (!is_function || symbol.kind == SymbolKind::Function);
        if settled || !prefixes.is_placeholder(&symbol.name) {
            return SymbolAction::Keep;
        }
    }

    match (is_function, existing) {
        (true, Some(symbol)) if symbol.kind == SymbolKind::Function => {
            SymbolAction::RenameFunction
        }
        (true, _) => SymbolAction::CreateFunction,
        (false, Some(_)) => SymbolAction::RenameLabel,
        (false, None) => SymbolAction::CreateLabel,
    }
}

/// Apply the planned action at `address`; returns the kind that changed.
pub fn apply_symbol<T: TargetProgram + ?Sized>(
    target: &mut T,
    address: Address,
    name: &str,
    is_function: bool,
    prefixes: &PlaceholderPrefixes,
) -> TargetResult<Option<SymbolKind>> {
    let existing = target.symbol(address)?;
    let action = plan_symbol(existing.as_ref(), name, is_function, prefixes);
    match action {
        SymbolAction::Keep => {}
        SymbolAction::RenameFunction | SymbolAction::RenameLabel => {
            target.rename_symbol(address, name, SymbolSource::Imported)?
        }
        SymbolAction::CreateFunction => target.create_function(address, name)?,
        SymbolAction::CreateLabel => {
            target.create_label(address, name, SymbolSource::Imported, true)?
        }
    }
    Ok(action.kind())
}

/// Joined view of label and function records.
///
/// Labels provide the address-to-name mapping; functions only mark which of
/// those addresses are function entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub function_starts: BTreeSet<Rva>,
    pub names: BTreeMap<Rva, String>,
    /// Records dropped because they belong to another module.
    pub filtered: usize,
}

impl SymbolTable {
    /// Build the table, keeping only records `belongs` accepts.
    ///
    /// Records without a module field always belong to the open module. When
    /// several labels share an address the last one wins.
    pub fn build<F>(labels: &[LabelRecord], functions: &[FunctionRecord], belongs: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut table = SymbolTable::default();
        let keep = |module: Option<&String>| module.map_or(true, |m| belongs(m));

        for function in functions {
            if keep(function.module.as_ref()) {
                table.function_starts.insert(function.start);
            } else {
                table.filtered += 1;
            }
        }
        for label in labels {
            if keep(label.module.as_ref()) {
                table.names.insert(label.address, label.text.clone());
            } else {
                table.filtered += 1;
            }
        }
        table
    }

    /// `(rva, name, is_function)` in ascending address order.
    pub fn entries(&self) -> impl Iterator<Item = (Rva, &str, bool)> + '_ {
        self.names
            .iter()
            .map(|(rva, name)| (*rva, name.as_str(), self.function_starts.contains(rva)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
