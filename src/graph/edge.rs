use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use super::node::NodeId;

/// The kind of directed relationship between two nodes in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// File -> symbol: the file defines this symbol. Emitted by parsing with
    /// confidence 1.0.
    Defines,
    /// Symbol -> symbol: caller invokes callee. Produced by the external
    /// call-edge resolver; this core only reads these.
    Calls,
}

impl RelationshipKind {
    /// Stable string form used in id hashing and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Defines => "DEFINES",
            RelationshipKind::Calls => "CALLS",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic 64-bit relationship identifier: hash of
/// `(kind, sourceId, targetId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipId(pub u64);

impl RelationshipId {
    pub fn of(kind: RelationshipKind, source: NodeId, target: NodeId) -> Self {
        let mut input = [0u8; 24];
        input[..8].copy_from_slice(&source.0.to_le_bytes());
        input[8..16].copy_from_slice(&target.0.to_le_bytes());
        input[16..16 + kind.as_str().len().min(8)]
            .copy_from_slice(&kind.as_str().as_bytes()[..kind.as_str().len().min(8)]);
        RelationshipId(xxh64(&input, 0))
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A directed, typed relationship between two graph nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub id: RelationshipId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub kind: RelationshipKind,
    /// Resolver confidence in [0, 1]. `Defines` edges are always 1.0.
    pub confidence: f32,
    /// Short human-readable provenance, e.g. "defines" or "exact match".
    pub reason: String,
}

impl GraphRelationship {
    pub fn new(
        kind: RelationshipKind,
        source_id: NodeId,
        target_id: NodeId,
        confidence: f32,
        reason: impl Into<String>,
    ) -> Self {
        GraphRelationship {
            id: RelationshipId::of(kind, source_id, target_id),
            source_id,
            target_id,
            kind,
            confidence,
            reason: reason.into(),
        }
    }

    /// A `DEFINES` edge from a file node to a symbol node, confidence 1.0.
    pub fn defines(file_id: NodeId, symbol_id: NodeId) -> Self {
        Self::new(RelationshipKind::Defines, file_id, symbol_id, 1.0, "defines")
    }
}
