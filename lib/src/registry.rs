//! Bidirectional lookup between diag log packet type codes and their canonical
//! names.
//!
//! The registry is built once from a fixed table and never mutated. An
//! unrecognized code or name is an ordinary, frequent condition (the modem
//! emits plenty of log types we don't decode), so lookups return `Option`
//! rather than an error.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::LazyLock;

use log::debug;
use thiserror::Error;

use crate::log_codes::{LOG_PACKET_TYPE_NAMES, NameEntry};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Duplicate log packet type code {0:#06x} (names {1:?} and {2:?})")]
    DuplicateCode(u16, &'static str, &'static str),
    #[error("Duplicate log packet type name {0:?} (codes {1:#06x} and {2:#06x})")]
    DuplicateName(&'static str, u16, u16),
    #[error("Empty name for log packet type code {0:#06x}")]
    EmptyName(u16),
}

/// Process-wide registry of the log packet types this crate knows about.
///
/// Built on first access. A malformed table is a build defect, so this panics
/// with the offending entry rather than serving ambiguous lookups.
pub static REGISTRY: LazyLock<PacketTypeRegistry> =
    LazyLock::new(|| match PacketTypeRegistry::new(&LOG_PACKET_TYPE_NAMES) {
        Ok(registry) => registry,
        Err(err) => panic!("invalid log packet type table: {err}"),
    });

#[derive(Debug, Clone)]
pub struct PacketTypeRegistry {
    entries: Vec<NameEntry>,
    by_code: HashMap<u16, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl PacketTypeRegistry {
    pub fn new(table: &[NameEntry]) -> Result<Self, RegistryError> {
        let mut by_code = HashMap::with_capacity(table.len());
        let mut by_name = HashMap::with_capacity(table.len());
        for (i, entry) in table.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(RegistryError::EmptyName(entry.code));
            }
            match by_code.entry(entry.code) {
                Entry::Occupied(existing) => {
                    let other: &NameEntry = &table[*existing.get()];
                    return Err(RegistryError::DuplicateCode(
                        entry.code, other.name, entry.name,
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
            match by_name.entry(entry.name) {
                Entry::Occupied(existing) => {
                    let other: &NameEntry = &table[*existing.get()];
                    return Err(RegistryError::DuplicateName(
                        entry.name, other.code, entry.code,
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }
        debug!("built log packet type registry with {} entries", table.len());
        Ok(PacketTypeRegistry {
            entries: table.to_vec(),
            by_code,
            by_name,
        })
    }

    pub fn name_for_code(&self, code: u16) -> Option<&'static str> {
        self.by_code.get(&code).map(|&i| self.entries[i].name)
    }

    /// Case-sensitive exact match on the canonical name.
    pub fn code_for_name(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).map(|&i| self.entries[i].code)
    }

    pub fn is_known(&self, code: u16) -> bool {
        self.by_code.contains_key(&code)
    }

    /// Every registered code, in the table's declared order.
    pub fn all_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(|entry| entry.code)
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn name_for_code(code: u16) -> Option<&'static str> {
    REGISTRY.name_for_code(code)
}

pub fn code_for_name(name: &str) -> Option<u16> {
    REGISTRY.code_for_name(name)
}

pub fn is_known(code: u16) -> bool {
    REGISTRY.is_known(code)
}

pub fn all_codes() -> impl Iterator<Item = u16> {
    REGISTRY.all_codes()
}
