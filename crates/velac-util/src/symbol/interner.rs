//! Global string table backing [`Symbol`](super::Symbol).
//!
//! The table is shared by every lexer and parser instance in the process.
//! Lookups go through a `DashMap` keyed with `ahash`, so concurrent parses
//! on separate threads can intern without blocking each other. Interned
//! strings are leaked to obtain a `'static` lifetime; the total set of
//! distinct strings in a compilation is bounded, so the table never shrinks.

use std::sync::{OnceLock, RwLock};

use ahash::RandomState;
use dashmap::DashMap;

use super::Symbol;

/// Thread-safe string table.
pub(super) struct StringTable {
    /// Maps interned string to its table index.
    map: DashMap<&'static str, u32, RandomState>,

    /// Index-to-string storage. Reads vastly outnumber writes.
    strings: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: RwLock::new(Vec::with_capacity(256)),
        }
    }

    /// Intern a string, returning its symbol.
    pub(super) fn intern(&self, string: &str) -> Symbol {
        if let Some(index) = self.map.get(string) {
            return Symbol::from_index(*index);
        }

        // Allocate under the entry lock so racing threads agree on one index.
        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        match self.map.entry(leaked) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Symbol::from_index(*entry.get()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let mut strings = self
                    .strings
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let index = strings.len() as u32;
                strings.push(leaked);
                entry.insert(index);
                Symbol::from_index(index)
            }
        }
    }

    /// Get the string for a table index.
    ///
    /// Indices only ever come from `intern`, so the lookup cannot miss.
    pub(super) fn get(&self, index: u32) -> &'static str {
        let strings = self
            .strings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        strings[index as usize]
    }
}

static STRING_TABLE: OnceLock<StringTable> = OnceLock::new();

/// Run `f` with the global string table.
pub(super) fn with_interner<T>(f: impl FnOnce(&StringTable) -> T) -> T {
    f(STRING_TABLE.get_or_init(StringTable::new))
}
