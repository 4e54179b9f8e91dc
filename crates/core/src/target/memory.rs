use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::model::{Address, Bookmark, Symbol, SymbolKind, SymbolSource};
use crate::target::{TargetError, TargetProgram, TargetResult};

/// In-memory program state.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgram {
    pub name: String,
    pub image_base: Address,
    pub address_limit: Option<u64>,
    pub comments: BTreeMap<Address, String>,
    pub bookmarks: BTreeMap<Address, Vec<Bookmark>>,
    pub symbols: BTreeMap<Address, Symbol>,
    rejected: HashSet<Address>,
    messages: RefCell<Vec<String>>,
}

impl MemoryProgram {
    pub fn new(name: impl Into<String>, image_base: Address) -> Self {
        Self { name: name.into(), image_base, ..Self::default() }
    }

    /// Builder-style helper to restrict the address space (e.g. 32-bit).
    pub fn with_address_limit(mut self, limit: u64) -> Self {
        self.address_limit = Some(limit);
        self
    }

    /// Make every write at `address` fail with `TargetError::Rejected`.
    pub fn reject_writes_at(&mut self, address: Address) {
        self.rejected.insert(address);
    }

    /// Seed an existing symbol.
    pub fn insert_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.address, symbol);
    }

    /// Messages passed to `report_info` / `report_error`, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn bookmark_count(&self, address: Address) -> usize {
        self.bookmarks.get(&address).map_or(0, Vec::len)
    }

    fn check_writable(&self, address: Address) -> TargetResult<()> {
        if self.rejected.contains(&address) {
            return Err(TargetError::Rejected { address, reason: "address is read-only".into() });
        }
        Ok(())
    }
}

impl TargetProgram for MemoryProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn image_base(&self) -> Address {
        self.image_base
    }

    fn address_limit(&self) -> u64 {
        self.address_limit.unwrap_or(u64::MAX)
    }

    fn eol_comment(&self, address: Address) -> TargetResult<Option<String>> {
        Ok(self.comments.get(&address).cloned())
    }

    fn set_eol_comment(&mut self, address: Address, text: &str) -> TargetResult<()> {
        self.check_writable(address)?;
        self.comments.insert(address, text.to_string());
        Ok(())
    }

    fn bookmarks(&self, address: Address) -> TargetResult<Vec<Bookmark>> {
        Ok(self.bookmarks.get(&address).cloned().unwrap_or_default())
    }

    fn create_bookmark(
        &mut self,
        address: Address,
        category: &str,
        description: &str,
    ) -> TargetResult<()> {
        self.check_writable(address)?;
        self.bookmarks.entry(address).or_default().push(Bookmark {
            address,
            category: category.to_string(),
            description: description.to_string(),
        });
        Ok(())
    }

    fn symbol(&self, address: Address) -> TargetResult<Option<Symbol>> {
        Ok(self.symbols.get(&address).cloned())
    }

    fn rename_symbol(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
    ) -> TargetResult<()> {
        self.check_writable(address)?;
        match self.symbols.get_mut(&address) {
            Some(symbol) => {
                symbol.name = name.to_string();
                symbol.source = source;
                Ok(())
            }
            None => Err(TargetError::Rejected { address, reason: "no symbol to rename".into() }),
        }
    }

    fn create_label(
        &mut self,
        address: Address,
        name: &str,
        source: SymbolSource,
        global: bool,
    ) -> TargetResult<()> {
        self.check_writable(address)?;
        self.symbols.insert(
            address,
            Symbol { address, name: name.to_string(), kind: SymbolKind::Label, source, global },
        );
        Ok(())
    }

    fn create_function(&mut self, address: Address, name: &str) -> TargetResult<()> {
        self.check_writable(address)?;
        self.symbols.insert(
            address,
            Symbol {
                address,
                name: name.to_string(),
                kind: SymbolKind::Function,
                source: SymbolSource::Imported,
                global: true,
            },
        );
        Ok(())
    }

    fn report_info(&self, message: &str) {
        tracing::info!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }

    fn report_error(&self, message: &str) {
        tracing::warn!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }
}
