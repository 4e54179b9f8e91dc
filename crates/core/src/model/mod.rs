//! Core value types shared by the record store, merger, and program database.
//!
//! Two address spaces show up throughout the crate:
//! - `Rva`: an offset relative to a module image, as stored by the debugger.
//! - `Address`: an absolute address inside the target program.
//!
//! Keeping them as distinct newtypes means an offset can never be written to the
//! target without going through the address translator first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Module-relative virtual offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rva(pub u64);

impl fmt::Display for Rva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Absolute address in the target program's address space.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub u64);

impl Address {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Parse a base-16 address string.
///
/// The `0x` prefix is optional. Returns `None` for empty or non-hex input.
pub fn parse_hex(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Whether a symbol names a function entry or any other location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Label,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Label => "label",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "function" => Some(SymbolKind::Function),
            "label" => Some(SymbolKind::Label),
            _ => None,
        }
    }
}

/// Where a symbol name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolSource {
    /// Placeholder synthesized by the program's own analysis.
    Default,
    Analysis,
    Imported,
    User,
}

impl SymbolSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolSource::Default => "default",
            SymbolSource::Analysis => "analysis",
            SymbolSource::Imported => "imported",
            SymbolSource::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(SymbolSource::Default),
            "analysis" => Some(SymbolSource::Analysis),
            "imported" => Some(SymbolSource::Imported),
            "user" => Some(SymbolSource::User),
            _ => None,
        }
    }

    /// True for names the program generated on its own.
    pub fn is_auto_generated(&self) -> bool {
        matches!(self, SymbolSource::Default)
    }
}

/// A named location in the target program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub address: Address,
    pub name: String,
    pub kind: SymbolKind,
    pub source: SymbolSource,
    /// Global (non-local) symbols live in the program namespace.
    pub global: bool,
}

impl Symbol {
    pub fn new(address: Address, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self { address, name: name.into(), kind, source: SymbolSource::User, global: true }
    }

    /// Builder-style helper to override the name source.
    pub fn with_source(mut self, source: SymbolSource) -> Self {
        self.source = source;
        self
    }
}

/// A location marker in the target program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub address: Address,
    pub category: String,
    pub description: String,
}
