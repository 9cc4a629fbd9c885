use serde::{Deserialize, Serialize};

use crate::graph::edge::GraphRelationship;
use crate::graph::node::{GraphNode, NodeId, NodeLabel};

/// Input to a parse worker: one file snapshot. Plain data so the worker body
/// can run in a thread, a thread pool, or a separate process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWorkerInput {
    pub path: String,
    pub content: String,
}

impl ParseWorkerInput {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// One symbol-table entry produced by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub file_path: String,
    pub name: String,
    pub node_id: NodeId,
    pub label: NodeLabel,
}

/// An import found in a file. `source` is the imported path/module text with
/// surrounding string quotes stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImport {
    pub file_path: String,
    pub source: String,
}

/// A call site found in a file.
///
/// Extraction is context-free: `caller_context_node_id` is `None` because
/// resolving the enclosing symbol requires the scope pass the downstream
/// call-edge resolver performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCall {
    pub file_path: String,
    pub caller_context_node_id: Option<NodeId>,
    pub callee_name: String,
    /// 1-based line of the call expression.
    pub line: usize,
}

/// The flavor of an inheritance edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeritageKind {
    Extends,
    Implements,
    Trait,
}

/// An inheritance/heritage relation found in a file, one record per parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedHeritage {
    pub file_path: String,
    pub child_name: String,
    pub parent_name: String,
    pub kind: HeritageKind,
}

/// Everything a parse worker extracted from its input files.
///
/// All fields are plain structured data (no syntax trees, no handles) so the
/// result can cross a process boundary unchanged. A file that could not be
/// parsed contributes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseWorkerResult {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
    pub symbols: Vec<SymbolEntry>,
    pub imports: Vec<ExtractedImport>,
    pub calls: Vec<ExtractedCall>,
    pub heritage: Vec<ExtractedHeritage>,
}

impl ParseWorkerResult {
    /// Fold another result into this one, preserving order.
    pub fn merge(&mut self, other: ParseWorkerResult) {
        self.nodes.extend(other.nodes);
        self.relationships.extend(other.relationships);
        self.symbols.extend(other.symbols);
        self.imports.extend(other.imports);
        self.calls.extend(other.calls);
        self.heritage.extend(other.heritage);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.relationships.is_empty()
            && self.symbols.is_empty()
            && self.imports.is_empty()
            && self.calls.is_empty()
            && self.heritage.is_empty()
    }
}

/// Deferred facts aggregated across all workers, handed to the downstream
/// call-edge and heritage resolvers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeferredFacts {
    pub imports: Vec<ExtractedImport>,
    pub calls: Vec<ExtractedCall>,
    pub heritage: Vec<ExtractedHeritage>,
}
