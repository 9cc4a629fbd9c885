use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::node::{NodeId, NodeLabel};

/// One `(file path, symbol name)` entry in the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub node_id: NodeId,
    pub label: NodeLabel,
}

/// Append-only index `(file path, symbol name) -> set of (node id, label)`.
///
/// Built during parsing and read-only afterwards. Multiple symbols may share
/// a name within a file (e.g. an overloaded function and a same-named type);
/// all are retained. Consumed by downstream call-edge resolvers.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<(String, String), Vec<SymbolRef>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symbol under `(file_path, name)`. Exact duplicates (same id
    /// and label) are ignored so repeated ingestion keeps set semantics.
    pub fn add(&mut self, file_path: &str, name: &str, node_id: NodeId, label: NodeLabel) {
        let slot = self
            .entries
            .entry((file_path.to_owned(), name.to_owned()))
            .or_default();
        let entry = SymbolRef { node_id, label };
        if !slot.contains(&entry) {
            slot.push(entry);
        }
    }

    /// All symbols recorded under `(file_path, name)`, in insertion order.
    pub fn lookup(&self, file_path: &str, name: &str) -> &[SymbolRef] {
        self.entries
            .get(&(file_path.to_owned(), name.to_owned()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct `(file path, name)` keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
