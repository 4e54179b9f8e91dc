use serde::{Deserialize, Serialize};

use crate::import::ImportSummary;
use crate::model::Address;

/// Identity of the program stored in a program database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramInfo {
    /// Module name as the debugger records it (e.g., "target.exe").
    pub name: String,
    /// Load base the module is analyzed at.
    pub image_base: Address,
    /// Pointer size in bytes (4 or 8).
    pub pointer_size: u8,
}

impl ProgramInfo {
    pub fn new(name: impl Into<String>, image_base: Address) -> Self {
        Self { name: name.into(), image_base, pointer_size: 8 }
    }

    /// Builder-style helper to set the pointer size.
    pub fn with_pointer_size(mut self, pointer_size: u8) -> Self {
        self.pointer_size = pointer_size;
        self
    }

    /// Highest address representable with this pointer size.
    pub fn address_limit(&self) -> u64 {
        match self.pointer_size {
            4 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }
}

/// Record of one import applied to the program database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportRunRecord {
    /// Path of the debugger database as given by the user.
    pub source_path: String,
    /// SHA-256 of the source document, if computed.
    pub source_hash: Option<String>,
    pub started_at: String,
    pub finished_at: String,
    pub summary: ImportSummary,
}
