use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// The label of a node in the knowledge graph.
///
/// Uses a plain enum (not strings) to avoid allocation at dispatch boundaries.
/// `File` is the container label; everything else is a definition kind. The
/// definition variants are listed in dispatch priority order — when a query
/// match carries more than one `@definition.<kind>` capture, the first kind
/// in this order wins (see [`DEFINITION_PRIORITY`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    File,
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    Namespace,
    Module,
    Trait,
    Impl,
    TypeAlias,
    Const,
    Static,
    Typedef,
    Macro,
    Union,
    Property,
    Record,
    Delegate,
    Annotation,
    Constructor,
    Template,
    /// Fallback for definition captures whose kind suffix is not recognized.
    CodeElement,
}

/// Definition labels in dispatch priority order. Excludes `File`.
pub const DEFINITION_PRIORITY: [NodeLabel; 23] = [
    NodeLabel::Function,
    NodeLabel::Method,
    NodeLabel::Class,
    NodeLabel::Interface,
    NodeLabel::Struct,
    NodeLabel::Enum,
    NodeLabel::Namespace,
    NodeLabel::Module,
    NodeLabel::Trait,
    NodeLabel::Impl,
    NodeLabel::TypeAlias,
    NodeLabel::Const,
    NodeLabel::Static,
    NodeLabel::Typedef,
    NodeLabel::Macro,
    NodeLabel::Union,
    NodeLabel::Property,
    NodeLabel::Record,
    NodeLabel::Delegate,
    NodeLabel::Annotation,
    NodeLabel::Constructor,
    NodeLabel::Template,
    NodeLabel::CodeElement,
];

impl NodeLabel {
    /// Stable string form used in id hashing and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::File => "File",
            NodeLabel::Function => "Function",
            NodeLabel::Method => "Method",
            NodeLabel::Class => "Class",
            NodeLabel::Interface => "Interface",
            NodeLabel::Struct => "Struct",
            NodeLabel::Enum => "Enum",
            NodeLabel::Namespace => "Namespace",
            NodeLabel::Module => "Module",
            NodeLabel::Trait => "Trait",
            NodeLabel::Impl => "Impl",
            NodeLabel::TypeAlias => "TypeAlias",
            NodeLabel::Const => "Const",
            NodeLabel::Static => "Static",
            NodeLabel::Typedef => "Typedef",
            NodeLabel::Macro => "Macro",
            NodeLabel::Union => "Union",
            NodeLabel::Property => "Property",
            NodeLabel::Record => "Record",
            NodeLabel::Delegate => "Delegate",
            NodeLabel::Annotation => "Annotation",
            NodeLabel::Constructor => "Constructor",
            NodeLabel::Template => "Template",
            NodeLabel::CodeElement => "CodeElement",
        }
    }

    /// The `@definition.<suffix>` capture suffix this label answers to.
    pub fn capture_suffix(&self) -> &'static str {
        match self {
            NodeLabel::File => "file",
            NodeLabel::Function => "function",
            NodeLabel::Method => "method",
            NodeLabel::Class => "class",
            NodeLabel::Interface => "interface",
            NodeLabel::Struct => "struct",
            NodeLabel::Enum => "enum",
            NodeLabel::Namespace => "namespace",
            NodeLabel::Module => "module",
            NodeLabel::Trait => "trait",
            NodeLabel::Impl => "impl",
            NodeLabel::TypeAlias => "type_alias",
            NodeLabel::Const => "const",
            NodeLabel::Static => "static",
            NodeLabel::Typedef => "typedef",
            NodeLabel::Macro => "macro",
            NodeLabel::Union => "union",
            NodeLabel::Property => "property",
            NodeLabel::Record => "record",
            NodeLabel::Delegate => "delegate",
            NodeLabel::Annotation => "annotation",
            NodeLabel::Constructor => "constructor",
            NodeLabel::Template => "template",
            NodeLabel::CodeElement => "code_element",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic 64-bit node identifier.
///
/// Computed as `xxh64(label NUL "filePath:name")` so repeated ingestion of the
/// same file produces stable ids regardless of worker scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Id of a symbol node: hash of `(label, "filePath:name")`.
    pub fn symbol(label: NodeLabel, file_path: &str, name: &str) -> Self {
        let mut input =
            String::with_capacity(label.as_str().len() + file_path.len() + name.len() + 2);
        input.push_str(label.as_str());
        input.push('\0'); // separator
        input.push_str(file_path);
        input.push(':');
        input.push_str(name);
        NodeId(xxh64(input.as_bytes(), 0))
    }

    /// Id of a file node: hash of `("File", filePath)`.
    pub fn file(file_path: &str) -> Self {
        let mut input = String::with_capacity(file_path.len() + 5);
        input.push_str(NodeLabel::File.as_str());
        input.push('\0');
        input.push_str(file_path);
        NodeId(xxh64(input.as_bytes(), 0))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Properties carried by every graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperties {
    /// The symbol's identifier name (for file nodes, the file name portion).
    pub name: String,
    /// Path of the file the node was extracted from.
    pub file_path: String,
    /// 1-based line where the definition name starts.
    pub start_line: usize,
    /// 1-based line where the definition name ends.
    pub end_line: usize,
    /// Language tag, e.g. "typescript" or "rust".
    pub language: String,
    /// Whether the symbol is visible outside its file/module (see exports.rs).
    pub is_exported: bool,
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: NodeLabel,
    pub properties: NodeProperties,
}

impl GraphNode {
    /// Build a file node for `file_path`. `end_line` is the file's line count.
    pub fn file(file_path: &str, language: &str, end_line: usize) -> Self {
        let name = file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_path)
            .to_owned();
        GraphNode {
            id: NodeId::file(file_path),
            label: NodeLabel::File,
            properties: NodeProperties {
                name,
                file_path: file_path.to_owned(),
                start_line: 1,
                end_line,
                language: language.to_owned(),
                is_exported: false,
            },
        }
    }
}
