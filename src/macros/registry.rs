//! Macro registry: lookup of the statically declared macros by name.
//!
//! The registry is fixed at build time. It is built once from
//! [`STANDARD_MACROS`](crate::macros::STANDARD_MACROS) and shared; there is no
//! runtime registration.
//!
//! # Example
//! ```rust
//! use sigil::macros::{MacroRegistry, MacroRole};
//! let registry = MacroRegistry::standard();
//! assert!(registry.contains("urlFromString"));
//! assert_eq!(registry.lookup("iCloudKeyValue").map(|e| e.role()), Some(MacroRole::Accessor));
//! assert!(registry.lookup("URLFromString").is_none());
//! ```

use crate::macros::std_macros::STANDARD_MACROS;
use crate::macros::{MacroDef, MacroRole};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One statically declared macro.
#[derive(Debug, Clone, Copy)]
pub struct MacroEntry {
    /// Name as written after `#` or `@`. Case-sensitive.
    pub name: &'static str,
    pub def: MacroDef,
    /// Declared signature, for listings.
    pub signature: &'static str,
    pub summary: &'static str,
}

impl MacroEntry {
    pub fn role(&self) -> MacroRole {
        self.def.role()
    }
}

static STANDARD: Lazy<MacroRegistry> = Lazy::new(|| MacroRegistry::from_entries(STANDARD_MACROS));

/// Name-indexed view over a static macro table.
#[derive(Debug)]
pub struct MacroRegistry {
    entries: &'static [MacroEntry],
    index: HashMap<&'static str, usize>,
}

impl MacroRegistry {
    /// The registry of every macro this crate provides.
    pub fn standard() -> &'static MacroRegistry {
        &STANDARD
    }

    /// Later entries never shadow earlier ones with the same name.
    fn from_entries(entries: &'static [MacroEntry]) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.name).or_insert(position);
        }
        Self { entries, index }
    }

    pub fn lookup(&self, name: &str) -> Option<&'static MacroEntry> {
        let entries = self.entries;
        self.index
            .get(name)
            .and_then(|&position| entries.get(position))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether `name` is an attached macro; used to pick attribute sites.
    pub fn is_attached(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|entry| entry.role() == MacroRole::Accessor)
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn entries(&self) -> &'static [MacroEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
