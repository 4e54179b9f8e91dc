//! Module-relative offset to absolute address translation.

use thiserror::Error;

use crate::model::{Address, Rva};

/// The translated address falls outside the target's address space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Offset {rva} from base {base} is outside the address space (limit {limit:#x})")]
pub struct AddressRangeError {
    pub rva: Rva,
    pub base: Address,
    pub limit: u64,
}

/// `base + rva` over the full 64-bit space.
pub fn translate(rva: Rva, base: Address) -> Result<Address, AddressRangeError> {
    AddressTranslator::new(base).translate(rva)
}

/// Translator bound to one program's load base and highest valid address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTranslator {
    pub base: Address,
    pub limit: u64,
}

impl AddressTranslator {
    pub fn new(base: Address) -> Self {
        Self { base, limit: u64::MAX }
    }

    /// Builder-style helper to cap results at `limit` (inclusive).
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn translate(&self, rva: Rva) -> Result<Address, AddressRangeError> {
        self.base
            .value()
            .checked_add(rva.0)
            .filter(|abs| *abs <= self.limit)
            .map(Address)
            .ok_or(AddressRangeError { rva, base: self.base, limit: self.limit })
    }
}

